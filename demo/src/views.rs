//! Components of the demo screen.

use fiberui::prelude::*;

fn key_handler(handler: impl Fn(&str) + 'static) -> Props {
    Props::new().on("keydown", move |event| {
        if let Some(key) = event.data() {
            handler(key);
        }
    })
}

/// `+` and `-` change a number.
pub fn counter() -> Component {
    Component::new("Counter", |hooks, _| {
        let (count, set_count) = hooks.use_state(0_i64);
        Ok(element(
            "section",
            key_handler(move |key| match key {
                "+" => set_count.update(|c| c + 1),
                "-" => set_count.update(|c| c - 1),
                _ => {}
            }),
            children![
                element("h2", Props::new(), children!["Counter"]),
                element(
                    "p",
                    Props::new(),
                    children!["count: ", element("b", Props::new(), children![count])]
                ),
            ],
        ))
    })
}

/// `a` and `r` add and remove rows.
pub fn rows() -> Component {
    Component::new("Rows", |hooks, _| {
        let (len, set_len) = hooks.use_state(2_u32);
        let items = (1..=len).map(|n| {
            Child::from(element("li", Props::new(), children![format!("row {n}")]))
        });
        Ok(element(
            "section",
            key_handler(move |key| match key {
                "a" => set_len.update(|n| n + 1),
                "r" => set_len.update(|n| n.saturating_sub(1)),
                _ => {}
            }),
            children![
                element("h2", Props::new(), children!["Rows"]),
                element("ul", Props::new(), items),
            ],
        ))
    })
}

/// `t` switches a paragraph between `p` and `pre`, replacing its host node.
pub fn toggle() -> Component {
    Component::new("Toggle", |hooks, _| {
        let (pre, set_pre) = hooks.use_state(false);
        let body = if pre {
            element("pre", Props::new().with("color", "yellow"), children!["  preformatted"])
        } else {
            element("p", Props::new(), children!["a plain paragraph"])
        };
        Ok(element(
            "section",
            key_handler(move |key| {
                if key == "t" {
                    set_pre.update(|on| !on);
                }
            }),
            children![element("h2", Props::new(), children!["Toggle"]), body],
        ))
    })
}

/// The whole screen.
pub fn screen() -> Element {
    element(
        "main",
        Props::new(),
        children![
            element("h1", Props::new().with("color", "cyan"), children!["fiberui demo"]),
            component(&counter(), Props::new()),
            component(&rows(), Props::new()),
            component(&toggle(), Props::new()),
            element(
                "p",
                Props::new().with("italic", true),
                children!["+/- count, a/r rows, t toggle, q quit"]
            ),
        ],
    )
}
