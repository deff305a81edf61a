mod common;

use std::sync::Arc;

use common::{day, memory_ledger, spend, Scripted, ScriptedInference};
use zenith_core::{
    coach::{
        advisor::{TIP_ERROR, TIP_MODEL_NOT_LOADED, TIP_NO_DATA},
        intent::SMALL_TALK_REPLIES,
        CoachSettings, FinancialCoach, AI_ERROR_PREFIX, MODEL_NOT_LOADED, NO_DATA,
    },
    ledger::LedgerStore,
};

fn populated_ledger() -> LedgerStore {
    let today = day(2025, 6, 15);
    let (_storage, mut store) = memory_ledger(today);
    spend(&mut store, 50.0, "Food", "groceries", day(2025, 6, 1));
    spend(&mut store, 50.0, "Food", "groceries", day(2025, 6, 8));
    spend(&mut store, 50.0, "Transport", "train pass", day(2025, 6, 12));
    store
}

#[tokio::test]
async fn arithmetic_in_output_is_replaced() {
    let store = populated_ledger();
    let inference = ScriptedInference::loaded();
    inference.push(Scripted::text("You bought groceries twice: $50 x 3 = $150 in total."));
    let coach = FinancialCoach::new(inference.clone());

    let answer = coach.answer(&store, "What is my total spend this month?").await;
    assert_eq!(
        answer,
        "Total spending for the last 30 days is $150.00 across 3 transactions, with an average of $50.00 per transaction."
    );
}

#[tokio::test]
async fn clean_output_is_returned_trimmed() {
    let store = populated_ledger();
    let inference = ScriptedInference::loaded();
    inference.push(Scripted::text("  You spent $150.00 across 3 transactions.\n"));
    let coach = FinancialCoach::new(inference);

    let answer = coach.answer(&store, "how much did I spend this month?").await;
    assert_eq!(answer, "You spent $150.00 across 3 transactions.");
}

#[tokio::test]
async fn blank_output_falls_back_to_rolling_total() {
    let store = populated_ledger();
    let inference = ScriptedInference::loaded();
    inference.push(Scripted::Tokens(vec!["  ".into(), "\n".into()]));
    let coach = FinancialCoach::new(inference);

    let answer = coach.answer(&store, "Is it smart to buy a bike?").await;
    assert_eq!(
        answer,
        "Total spending for the last 30 days is $150.00 across 3 transactions."
    );
}

#[tokio::test]
async fn unloaded_model_short_circuits_everything() {
    let store = populated_ledger();
    let inference = ScriptedInference::unloaded();
    let coach = FinancialCoach::new(inference.clone());

    assert_eq!(coach.answer(&store, "hello").await, MODEL_NOT_LOADED);
    assert_eq!(coach.answer(&store, "how much?").await, MODEL_NOT_LOADED);
    assert!(inference.calls().is_empty());
}

#[tokio::test]
async fn small_talk_never_reaches_the_model() {
    let (_storage, store) = memory_ledger(day(2025, 6, 15));
    let inference = ScriptedInference::loaded();
    let coach = FinancialCoach::new(inference.clone());

    for greeting in ["hi", "Good morning!", "thanks", "What's up"] {
        let reply = coach.answer(&store, greeting).await;
        assert!(SMALL_TALK_REPLIES.contains(&reply.as_str()), "{greeting}: {reply}");
    }
    assert!(inference.calls().is_empty());
}

#[tokio::test]
async fn empty_ledger_reports_no_data() {
    let (_storage, store) = memory_ledger(day(2025, 6, 15));
    let inference = ScriptedInference::loaded();
    let coach = FinancialCoach::new(inference.clone());

    assert_eq!(coach.answer(&store, "where does my money go?").await, NO_DATA);
    assert!(inference.calls().is_empty());
}

#[tokio::test]
async fn inference_failures_are_prefixed() {
    let store = populated_ledger();
    let inference = ScriptedInference::loaded();
    inference.push(Scripted::Refuse("server unavailable".into()));
    inference.push(Scripted::Break(vec!["You ".into()], "connection reset".into()));
    let coach = FinancialCoach::new(inference);

    let refused = coach.answer(&store, "average per transaction?").await;
    assert_eq!(refused, format!("{AI_ERROR_PREFIX}stream error: server unavailable"));

    let broken = coach.answer(&store, "average per transaction?").await;
    assert_eq!(broken, format!("{AI_ERROR_PREFIX}stream error: connection reset"));
}

#[tokio::test]
async fn prompt_carries_fact_and_generation_options() {
    let store = populated_ledger();
    let inference = ScriptedInference::loaded();
    inference.push(Scripted::text("Fine."));
    let coach = FinancialCoach::new(inference.clone());

    coach.answer(&store, "how much did I spend this month?").await;

    let calls = inference.calls();
    assert_eq!(calls.len(), 1);
    let call = &calls[0];
    assert!(call.prompt.contains(
        "DIRECT ANSWER: Total spending in the last 30 days is exactly $150.00 across 3 transactions."
    ));
    assert!(call.prompt.contains("USER QUESTION: \"how much did I spend this month?\""));
    assert!(call.prompt.contains("1. train pass [Transport]: $50.00"));
    assert_eq!(call.options.max_tokens, 150);
    assert!((call.options.temperature - 0.1).abs() < f32::EPSILON);
    assert!(call
        .options
        .system_prompt
        .as_deref()
        .unwrap_or_default()
        .contains("NEVER do arithmetic"));
}

#[tokio::test]
async fn open_ended_question_has_no_fact() {
    let store = populated_ledger();
    let inference = ScriptedInference::loaded();
    inference.push(Scripted::text("Maybe."));
    let coach = FinancialCoach::new(inference.clone());

    coach.answer(&store, "Is it smart to buy a bike?").await;
    assert!(!inference.calls()[0].prompt.contains("DIRECT ANSWER"));
}

#[tokio::test]
async fn streaming_sink_sees_every_fragment() {
    let store = populated_ledger();
    let inference = ScriptedInference::loaded();
    inference.push(Scripted::Tokens(vec![
        "Groceries ".into(),
        "lead ".into(),
        "at $100.00.".into(),
    ]));
    let coach = FinancialCoach::new(inference);

    let mut seen = Vec::new();
    let answer = coach
        .answer_streaming(&store, "which category is top?", |fragment| {
            seen.push(fragment.to_string())
        })
        .await;
    assert_eq!(seen, vec!["Groceries ", "lead ", "at $100.00."]);
    assert_eq!(answer, "Groceries lead at $100.00.");
}

#[tokio::test]
async fn tip_uses_its_own_limits_and_fallbacks() {
    let store = populated_ledger();
    let inference = ScriptedInference::loaded();
    inference.push(Scripted::text("Cook at home twice a week to trim your $100.00 food bill."));
    inference.push(Scripted::Tokens(Vec::new()));
    inference.push(Scripted::Refuse("boom".into()));
    let settings = CoachSettings::default();
    let coach = FinancialCoach::with_settings(inference.clone(), settings);

    assert_eq!(
        coach.tip(&store).await,
        "Cook at home twice a week to trim your $100.00 food bill."
    );
    assert_eq!(
        coach.tip(&store).await,
        "Your top spending category is Food at $100.00. Consider setting a weekly limit for it."
    );
    assert_eq!(coach.tip(&store).await, TIP_ERROR);

    let call = &inference.calls()[0];
    assert_eq!(call.options.max_tokens, 80);
    assert!(call.options.system_prompt.is_none());
    assert!(call.prompt.contains("Highest category: Food at $100.00"));
}

#[tokio::test]
async fn tip_guards_mirror_answers() {
    let (_storage, empty) = memory_ledger(day(2025, 6, 15));
    let loaded = FinancialCoach::new(ScriptedInference::loaded());
    assert_eq!(loaded.tip(&empty).await, TIP_NO_DATA);

    let unloaded = FinancialCoach::new(Arc::new(ScriptedInference::default()));
    assert_eq!(unloaded.tip(&populated_ledger()).await, TIP_MODEL_NOT_LOADED);
}
