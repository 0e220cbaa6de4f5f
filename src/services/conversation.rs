use std::sync::OnceLock;

use chrono::NaiveDate;
use regex::Regex;

use crate::models::{Action, AlertCondition, AlertKind, Reply, Session, Step};
use crate::services::market_data::MarketData;
use crate::services::{alert_monitor, alerts_service};
use crate::AppState;

/// One user turn: either typed text or a tapped button id.
#[derive(Debug, Clone, Copy)]
pub enum Input<'a> {
    Text(&'a str),
    Action(&'a str),
}

/// Result of feeding one input into an authoring session.
#[derive(Debug)]
pub enum StepOutcome {
    /// The dialogue continues (possibly after a re-prompt in place).
    Continue(Reply),
    /// The draft is complete; the caller persists it.
    Complete {
        ticker: String,
        condition: AlertCondition,
    },
}

fn ticker_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^\^?[A-Z0-9.\-]{1,12}$").expect("ticker pattern"))
}

// ---------------- Command dispatch ----------------

pub async fn handle_text(state: &AppState, user_id: i64, text: &str) -> Reply {
    let text = text.trim();

    match text {
        "/start" => {
            end_session(state, user_id).await;
            Reply::text(
                "👋 Welcome to the stock alert bot! Use /newalert to add a new alert or /menu for the main menu.",
            )
        }
        "/menu" => {
            end_session(state, user_id).await;
            main_menu_reply()
        }
        "/newalert" => start_authoring(state, user_id).await,
        "/listalerts" => list_alerts_reply(state, user_id).await,
        "/cancel" => cancel(state, user_id).await,
        _ => dispatch(state, user_id, Input::Text(text)).await,
    }
}

pub async fn handle_action(state: &AppState, user_id: i64, action: &str) -> Reply {
    match action {
        "main_menu" => cancel(state, user_id).await,
        "new_alert" => start_authoring(state, user_id).await,
        "list_alerts" => list_alerts_reply(state, user_id).await,
        "help" => help_reply(),
        "send_all_charts" => send_all_charts(state, user_id).await,
        a if a.starts_with("remove_") => remove_action(state, user_id, a).await,
        a if a.starts_with("keep_") => {
            Reply::text("ℹ️ Alert kept and will trigger again if conditions are met.")
        }
        _ => dispatch(state, user_id, Input::Action(action)).await,
    }
}

async fn start_authoring(state: &AppState, user_id: i64) -> Reply {
    let mut sessions = state.sessions.lock().await;
    sessions.insert(user_id, Session::new());
    type_menu_reply()
}

async fn end_session(state: &AppState, user_id: i64) {
    state.sessions.lock().await.remove(&user_id);
}

async fn cancel(state: &AppState, user_id: i64) -> Reply {
    end_session(state, user_id).await;
    main_menu_reply()
}

/// Routes an input into the user's in-progress session, if any. The session
/// is taken out of the map while it is being advanced, so a user can never
/// race their own dialogue.
async fn dispatch(state: &AppState, user_id: i64, input: Input<'_>) -> Reply {
    let session = {
        let mut sessions = state.sessions.lock().await;
        sessions.remove(&user_id)
    };

    let Some(mut session) = session else {
        return Reply::text("Use /newalert to create an alert or /menu for the main menu.");
    };

    match advance(&mut session, input, state.market.as_ref()).await {
        StepOutcome::Continue(reply) => {
            state.sessions.lock().await.insert(user_id, session);
            reply
        }
        StepOutcome::Complete { ticker, condition } => {
            match alerts_service::create_alert(state, user_id, &ticker, condition).await {
                Ok(alert) => {
                    if matches!(alert.condition, AlertCondition::CustomLine { .. }) {
                        // immediate illustrative chart; never blocks the reply
                        let state = state.clone();
                        let alert = alert.clone();
                        tokio::spawn(async move {
                            alert_monitor::send_alert_chart(&state, user_id, &alert).await;
                        });
                    }
                    Reply::with_actions(
                        success_text(&alert.ticker, &alert.condition),
                        vec![
                            Action::new("new_alert", "➕ Add another"),
                            Action::new("main_menu", "🏠 Main menu"),
                        ],
                    )
                }
                Err(e) => {
                    tracing::error!("failed to save alert for user {user_id}: {e}");
                    // keep the session so the last input can be retried
                    state.sessions.lock().await.insert(user_id, session);
                    Reply::text("❌ Could not save your alert. Please try again.")
                }
            }
        }
    }
}

fn success_text(ticker: &str, condition: &AlertCondition) -> String {
    match condition {
        AlertCondition::Price { .. } => format!("✅ Price alert set for {ticker}!"),
        AlertCondition::Sma { .. } => format!("✅ SMA alert set for {ticker}!"),
        AlertCondition::CustomLine {
            date1,
            date2,
            threshold,
            ..
        } => format!("✅ Trend line alert set for {ticker} from {date1} to {date2} (±{threshold})!"),
    }
}

// ---------------- Menu / list / callback replies ----------------

pub fn main_menu_reply() -> Reply {
    Reply::with_actions(
        "🏠 Main menu\n\nSelect an option to proceed:",
        vec![
            Action::new("new_alert", "➕ New alert"),
            Action::new("list_alerts", "📋 List alerts"),
            Action::new("help", "❓ Help"),
        ],
    )
}

fn help_reply() -> Reply {
    Reply::with_actions(
        "ℹ️ Help\n\n\
         • Use /newalert to create a price, SMA, or trend line alert.\n\
         • Use /listalerts to view and manage your active alerts.\n\
         • Alerts are checked every minute while the market is open.",
        vec![Action::new("main_menu", "🏠 Back to menu")],
    )
}

fn type_menu_reply() -> Reply {
    Reply::with_actions(
        "Please choose the type of alert:",
        vec![
            Action::new("price", "💰 Price alert"),
            Action::new("sma", "📈 SMA alert"),
            Action::new("custom_line", "📊 Trend line alert"),
            Action::new("main_menu", "❌ Cancel"),
        ],
    )
}

fn direction_menu_reply() -> Reply {
    Reply::with_actions(
        "Choose direction:",
        vec![
            Action::new("above", "⬆️ Above"),
            Action::new("below", "⬇️ Below"),
        ],
    )
}

async fn list_alerts_reply(state: &AppState, user_id: i64) -> Reply {
    let alerts = match alerts_service::list_alerts(state, user_id).await {
        Ok(v) => v,
        Err(e) => {
            tracing::error!("failed to list alerts for user {user_id}: {e}");
            return Reply::text("❌ Could not load your alerts. Please try again.");
        }
    };

    if alerts.is_empty() {
        return Reply::with_actions(
            "😅 You have no active alerts.",
            vec![
                Action::new("new_alert", "➕ New alert"),
                Action::new("main_menu", "🏠 Main menu"),
            ],
        );
    }

    let mut text = String::from("🔔 Active alerts:\n");
    let mut actions = Vec::new();
    for (i, alert) in alerts.iter().enumerate() {
        text.push_str(&format!("{}. {}\n", i + 1, alert.describe()));
        actions.push(Action::new(
            format!("remove_{}", alert.id),
            format!("Remove alert {}", i + 1),
        ));
    }
    actions.push(Action::new("send_all_charts", "📊 Send all charts"));
    actions.push(Action::new("main_menu", "🏠 Back to menu"));

    Reply::with_actions(text, actions)
}

async fn send_all_charts(state: &AppState, user_id: i64) -> Reply {
    let alerts = match alerts_service::list_alerts(state, user_id).await {
        Ok(v) => v,
        Err(e) => {
            tracing::error!("failed to list alerts for user {user_id}: {e}");
            return Reply::text("❌ Could not load your alerts. Please try again.");
        }
    };

    if alerts.is_empty() {
        return Reply::text("😅 You have no active alerts to graph.");
    }

    let state = state.clone();
    tokio::spawn(async move {
        for alert in alerts {
            alert_monitor::send_alert_chart(&state, user_id, &alert).await;
        }
    });

    Reply::text("Please wait, charts are being generated…")
}

async fn remove_action(state: &AppState, user_id: i64, action: &str) -> Reply {
    let id = action
        .strip_prefix("remove_")
        .and_then(|s| s.parse::<i64>().ok());

    let Some(id) = id else {
        return Reply::text("❌ Failed to remove alert. Invalid alert id.");
    };

    match alerts_service::remove_alert(state, user_id, id).await {
        Ok(()) => Reply::with_actions(
            "✅ Alert removed.",
            vec![Action::new("main_menu", "🏠 Main menu")],
        ),
        Err(e) => {
            tracing::warn!("failed to remove alert {id} for user {user_id}: {e}");
            Reply::text("❌ Failed to remove alert.")
        }
    }
}

// ---------------- The state machine ----------------

/// Advances one authoring session by one input. Invalid input at any step
/// re-prompts without a state change; there is no retry cap.
pub async fn advance(
    session: &mut Session,
    input: Input<'_>,
    market: &dyn MarketData,
) -> StepOutcome {
    match session.step {
        Step::SelectType => select_type(session, input),
        Step::EnterTicker => enter_ticker(session, input),
        Step::EnterPeriod => enter_period(session, input),
        Step::EnterPrice => enter_price(session, input),
        Step::EnterDirection => enter_direction(session, input),
        Step::EnterDate1 => enter_date(session, input, market, true).await,
        Step::EnterDate2 => enter_date(session, input, market, false).await,
        Step::ResolvePrice1 => resolve_price(session, input, true),
        Step::ResolvePrice2 => resolve_price(session, input, false),
        Step::EnterThreshold => enter_threshold(session, input),
    }
}

fn select_type(session: &mut Session, input: Input<'_>) -> StepOutcome {
    if let Input::Action(a) = input {
        if let Some(kind) = AlertKind::parse(a) {
            session.draft.kind = Some(kind);
            session.step = Step::EnterTicker;
            return StepOutcome::Continue(Reply::text(
                "✍️ Enter the stock ticker (e.g. AAPL):",
            ));
        }
    }
    StepOutcome::Continue(type_menu_reply())
}

fn enter_ticker(session: &mut Session, input: Input<'_>) -> StepOutcome {
    let Input::Text(text) = input else {
        return StepOutcome::Continue(Reply::text("✍️ Enter the stock ticker (e.g. AAPL):"));
    };

    let ticker = text.trim().to_uppercase();
    if !ticker_re().is_match(&ticker) {
        return StepOutcome::Continue(Reply::text(
            "❌ That does not look like a ticker symbol. Try again:",
        ));
    }
    session.draft.ticker = Some(ticker);

    match session.draft.kind {
        Some(AlertKind::Sma) => {
            session.step = Step::EnterPeriod;
            StepOutcome::Continue(Reply::text("✍️ Enter the SMA period (e.g. 20):"))
        }
        Some(AlertKind::Price) => {
            session.step = Step::EnterPrice;
            StepOutcome::Continue(Reply::text("✍️ Enter the target price:"))
        }
        Some(AlertKind::CustomLine) => {
            session.step = Step::EnterDate1;
            StepOutcome::Continue(Reply::text("✍️ Enter the first date (YYYY-MM-DD):"))
        }
        None => {
            // unreachable in practice: the kind is set before this step
            session.step = Step::SelectType;
            StepOutcome::Continue(type_menu_reply())
        }
    }
}

fn enter_period(session: &mut Session, input: Input<'_>) -> StepOutcome {
    let parsed = match input {
        Input::Text(t) => t.trim().parse::<u32>().ok().filter(|p| *p > 0),
        Input::Action(_) => None,
    };

    match parsed {
        Some(period) => {
            session.draft.period = Some(period);
            session.step = Step::EnterDirection;
            StepOutcome::Continue(direction_menu_reply())
        }
        None => StepOutcome::Continue(Reply::text(
            "❌ Invalid input. Enter a whole number of periods:",
        )),
    }
}

fn enter_price(session: &mut Session, input: Input<'_>) -> StepOutcome {
    let parsed = match input {
        Input::Text(t) => t.trim().parse::<f64>().ok().filter(|p| p.is_finite()),
        Input::Action(_) => None,
    };

    match parsed {
        Some(price) => {
            session.draft.target_price = Some(price);
            session.step = Step::EnterDirection;
            StepOutcome::Continue(direction_menu_reply())
        }
        None => StepOutcome::Continue(Reply::text("❌ Invalid input. Enter a numeric price:")),
    }
}

fn enter_direction(session: &mut Session, input: Input<'_>) -> StepOutcome {
    if let Input::Action(a) = input {
        if let Some(direction) = crate::models::Direction::parse(a) {
            session.draft.direction = Some(direction);
            return complete_from_draft(session);
        }
    }
    StepOutcome::Continue(direction_menu_reply())
}

async fn enter_date(
    session: &mut Session,
    input: Input<'_>,
    market: &dyn MarketData,
    first: bool,
) -> StepOutcome {
    let Input::Text(text) = input else {
        return StepOutcome::Continue(Reply::text("✍️ Enter a date (YYYY-MM-DD):"));
    };

    let date = match NaiveDate::parse_from_str(text.trim(), "%Y-%m-%d") {
        Ok(d) => d,
        Err(_) => {
            return StepOutcome::Continue(Reply::text(
                "❌ Invalid date format. Please use YYYY-MM-DD:",
            ));
        }
    };

    if first {
        session.draft.date1 = Some(date);
        session.step = Step::ResolvePrice1;
    } else {
        session.draft.date2 = Some(date);
        session.step = Step::ResolvePrice2;
    }

    let ticker = session.draft.ticker.clone().unwrap_or_default();

    match market.fetch_daily(&ticker, date, date).await {
        Ok(series) if !series.is_empty() => {
            let day = &series[0];
            StepOutcome::Continue(Reply::with_actions(
                "Choose the price for this date, or type one:",
                vec![
                    Action::new(format!("price_{}", day.high), format!("⬆️ High: {:.2}", day.high)),
                    Action::new(format!("price_{}", day.low), format!("⬇️ Low: {:.2}", day.low)),
                ],
            ))
        }
        Ok(_) => StepOutcome::Continue(Reply::text(format!(
            "No data found for {ticker} on {date}. Enter the price manually:"
        ))),
        Err(e) => {
            tracing::warn!("anchor price lookup failed for {ticker} on {date}: {e}");
            StepOutcome::Continue(Reply::text(format!(
                "No data found for {ticker} on {date}. Enter the price manually:"
            )))
        }
    }
}

fn resolve_price(session: &mut Session, input: Input<'_>, first: bool) -> StepOutcome {
    let parsed = match input {
        Input::Action(a) => a.strip_prefix("price_").and_then(|s| s.parse::<f64>().ok()),
        Input::Text(t) => t.trim().parse::<f64>().ok().filter(|p| p.is_finite()),
    };

    let Some(price) = parsed else {
        return StepOutcome::Continue(Reply::text("❌ Enter a numeric price:"));
    };

    if first {
        session.draft.price1 = Some(price);
        session.step = Step::EnterDate2;
        StepOutcome::Continue(Reply::text("✍️ Enter the second date (YYYY-MM-DD):"))
    } else {
        session.draft.price2 = Some(price);
        session.step = Step::EnterThreshold;
        StepOutcome::Continue(threshold_prompt())
    }
}

fn threshold_prompt() -> Reply {
    Reply::with_actions(
        "✍️ Enter a threshold value, or use the default:",
        vec![Action::new("threshold_default", "Default (±0.5)")],
    )
}

fn enter_threshold(session: &mut Session, input: Input<'_>) -> StepOutcome {
    let parsed = match input {
        Input::Action("threshold_default") => Some(0.5),
        Input::Text(t) => t.trim().parse::<f64>().ok().filter(|p| p.is_finite()),
        Input::Action(_) => None,
    };

    match parsed {
        Some(threshold) if threshold >= 0.0 => {
            session.draft.threshold = Some(threshold);
            complete_from_draft(session)
        }
        Some(_) => StepOutcome::Continue(Reply::text("❌ The threshold must be zero or positive:")),
        None => StepOutcome::Continue(Reply::text(
            "❌ Invalid input. Enter a numeric threshold:",
        )),
    }
}

fn complete_from_draft(session: &mut Session) -> StepOutcome {
    let ticker = session.draft.ticker.clone().unwrap_or_default();

    match session.draft.clone().into_condition() {
        Some(condition) => StepOutcome::Complete { ticker, condition },
        None => {
            // a field went missing mid-dialogue; restart rather than guess
            *session = Session::new();
            StepOutcome::Continue(type_menu_reply())
        }
    }
}
