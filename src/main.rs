//! Renders a parameter definition as a prompt panel and prints the widget
//! tree. With a second definition, the panel is refreshed against it the way
//! a report server round trip would.
//!
//! ```text
//! prompt-panel <definition.json> [next-definition.json]
//! ```

use std::cell::RefCell;
use std::rc::Rc;

use anyhow::{Context, Result};
use futures::FutureExt;
use prompt_kit::prelude::*;
use prompt_kit::prompting::{FetchFuture, ScrollOffset};

/// Host that logs what a toolkit would be asked to do
struct LoggingHost;

impl WidgetHost for LoggingHost {
    fn on_mount(&mut self, node: &WidgetNode) {
        ::log::debug!("mount {} '{}'", node.role.name(), node.name);
    }

    fn on_release(&mut self, node: &WidgetNode) {
        ::log::debug!("release {} '{}'", node.role.name(), node.name);
    }

    fn focus(&mut self, node: &WidgetNode) {
        ::log::info!("focus '{}'", node.name);
    }

    fn scroll_to(&mut self, _node: &WidgetNode, offset: ScrollOffset) {
        ::log::info!("scroll to {}, {}", offset.top, offset.left);
    }
}

fn load_definition(path: &str) -> Result<ParameterDefinition> {
    let json = std::fs::read_to_string(path).with_context(|| format!("reading {path}"))?;
    ParameterDefinition::from_json(&json).with_context(|| format!("parsing {path}"))
}

fn load_config() -> Result<PromptPanelConfig> {
    match std::env::var("PROMPT_PANEL_CONFIG") {
        Ok(path) => {
            let json = std::fs::read_to_string(&path).with_context(|| format!("reading {path}"))?;
            Ok(PromptPanelConfig::from_json(&json)?)
        }
        Err(_) => Ok(PromptPanelConfig::default()),
    }
}

fn main() -> Result<()> {
    env_logger::Builder::from_default_env()
        .filter_level(::log::LevelFilter::Info)
        .parse_default_env()
        .init();

    let mut args = std::env::args().skip(1);
    let Some(first_path) = args.next() else {
        anyhow::bail!("usage: prompt-panel <definition.json> [next-definition.json]");
    };
    let first = load_definition(&first_path)?;
    let next = args.next().map(|p| load_definition(&p)).transpose()?;
    let refresh = next.is_some();

    let mut queued = next;
    let source = prompt_kit::prompting::from_fn(move |request: FetchRequest| -> FetchFuture {
        ::log::info!("fetching definition for {} values", request.parameter_values.len());
        futures::future::ready(Ok(queued.take())).boxed_local()
    });

    let mut panel = PromptPanel::new(
        "promptPanel",
        Some(first),
        Box::new(WidgetRegistry::with_standard_catalog()),
        Box::new(LoggingHost),
        Box::new(source),
        load_config()?,
    )?;

    let submits = Rc::new(RefCell::new(0));
    let counter = submits.clone();
    panel.on_submit(move |options| {
        *counter.borrow_mut() += 1;
        ::log::info!("submit (init: {})", options.is_init);
    });
    panel.on_state_changed(|field, old, new| ::log::info!("{}: {old} -> {new}", field.as_str()));
    panel.on_error(|err| ::log::error!("{err}"));

    panel.init();
    print_tree(&panel);

    if refresh {
        panel.refresh_prompt(false);
        panel.run_until_stalled();
        if let Some(deadline) = panel.next_deadline() {
            panel.advance_to(deadline);
        }
        println!();
        print_tree(&panel);
    }

    println!("{}", serde_json::to_string_pretty(&panel.get_state()?)?);
    ::log::info!("{} submit(s)", submits.borrow());
    Ok(())
}

fn print_tree(panel: &PromptPanel) {
    match panel.widget_tree() {
        Some(tree) => print!("{}", tree.outline()),
        None => println!("(no prompt panel)"),
    }
}
