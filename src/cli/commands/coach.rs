use super::{usage_error, CommandDefinition, CommandResult};
use crate::cli::{context::ShellContext, output};

pub(crate) fn definitions() -> Vec<CommandDefinition> {
    vec![
        CommandDefinition::new(
            "ask",
            "Ask the coach about your spending",
            "ask <question...>",
            cmd_ask,
        )
        .free_text(),
        CommandDefinition::new("tip", "Get a one-sentence saving tip", "tip", cmd_tip),
        CommandDefinition::new(
            "model",
            "Show or load the language model",
            "model [status|load <name>]",
            cmd_model,
        ),
    ]
}

fn cmd_ask(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let question = args.join(" ");
    let question = unquote(question.trim());
    if question.is_empty() {
        return Err(usage_error("ask <question...>"));
    }

    let mut streamed = String::new();
    let answer = context.block_on(context.coach.answer_streaming(
        &context.store,
        &question,
        |fragment| {
            output::fragment(fragment);
            streamed.push_str(fragment);
        },
    ));

    if streamed.is_empty() {
        output::info(&answer);
    } else {
        output::end_line();
        // The guard replaced what was streamed.
        if streamed.trim() != answer {
            output::warning("Answer corrected from verified figures:");
            output::info(&answer);
        }
    }
    Ok(())
}

/// Drops one pair of matching quotes wrapped around the whole question.
fn unquote(text: &str) -> &str {
    ['"', '\'']
        .iter()
        .find_map(|quote| {
            text.strip_prefix(*quote)
                .and_then(|rest| rest.strip_suffix(*quote))
        })
        .map(str::trim)
        .unwrap_or(text)
}

fn cmd_tip(context: &mut ShellContext, _args: &[&str]) -> CommandResult {
    let tip = context.block_on(context.coach.tip(&context.store));
    output::info(tip);
    Ok(())
}

fn cmd_model(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    match args {
        [] | ["status"] => {
            let settings = &context.config.model;
            output::section("Model");
            output::info(format!("  Endpoint : {}", settings.endpoint));
            output::info(format!(
                "  Name     : {}",
                settings.name.as_deref().unwrap_or("(none)")
            ));
            output::info(format!(
                "  Loaded   : {}",
                if context.coach.is_ready() { "yes" } else { "no" }
            ));
            Ok(())
        }
        ["load", name] => {
            context.block_on(context.inference.load_model(name))?;
            context.config.model.name = Some(name.to_string());
            context.config.model.auto_load = true;
            context.persist_config()?;
            output::success(format!("Model `{name}` loaded."));
            Ok(())
        }
        _ => Err(usage_error("model [status|load <name>]")),
    }
}

#[cfg(test)]
mod tests {
    use super::unquote;

    #[test]
    fn unquote_strips_one_matching_pair() {
        assert_eq!(unquote("\"how much?\""), "how much?");
        assert_eq!(unquote("'what's up'"), "what's up");
        assert_eq!(unquote("what's up"), "what's up");
        assert_eq!(unquote("\""), "\"");
    }
}
