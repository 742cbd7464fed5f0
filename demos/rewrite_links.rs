use html5_tagrewriter::parsers::html::{set_node_attr, set_text_content};
use html5_tagrewriter::{Handle, RewriteHandler, RewriteResult, TagRewriter};

struct DemoRewriteHandler;

impl RewriteHandler for DemoRewriteHandler {
    fn applies_to(&self) -> String {
        "//html:a".to_string()
    }

    fn on_match(&mut self, node: &Handle) -> RewriteResult<()> {
        set_node_attr(node, "href", Some("https://github.com/webfactory/html5-tagrewriter"));
        set_text_content(node, "check this out");
        Ok(())
    }
}

fn main() -> RewriteResult<()> {
    let mut tagrewriter = TagRewriter::new();
    tagrewriter.register(DemoRewriteHandler);

    let document = r##"<!DOCTYPE html>
<html>
<body>
    <p><a href="#">link</a></p>
    <esi:include src="/footer" />
</body>
</html>"##;

    println!("{}", tagrewriter.process(document)?);

    Ok(())
}
