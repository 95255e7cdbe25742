use crate::channel::js_literal;
use crate::keys::KeySet;

/// Client-side `keyup` filter for one element.
///
/// On every native `keyup` whose `key` is in the captured list, a
/// `CustomEvent` named `event` is dispatched on the same node with the
/// original event as `detail`, bubbling and cancelable. Runtimes without a
/// callable `CustomEvent` constructor go through `document.createEvent`.
#[derive(Debug, Clone)]
pub struct KeyFilterScript<'a> {
    pub target: String,
    pub event: &'a str,
    pub keys: &'a KeySet,
}

impl KeyFilterScript<'_> {
    pub fn render(&self) -> String {
        let target = &self.target;
        let keys = self.keys.to_js_array();
        let event = js_literal(self.event);

        format!(
            r#"(function () {{
    var target = {target};
    var keys = {keys};
    target.addEventListener("keyup", function (origEvent) {{
        if (keys.indexOf(origEvent.key) === -1) {{
            return;
        }}
        var synthetic;
        if (typeof window.CustomEvent === 'function') {{
            synthetic = new CustomEvent({event}, {{ bubbles: true, cancelable: true, detail: origEvent }});
        }} else {{
            synthetic = document.createEvent('CustomEvent');
            synthetic.initCustomEvent({event}, true, true, origEvent);
        }}
        target.dispatchEvent(synthetic);
    }});
}})();"#
        )
    }
}
