//! Task creation commands: structured fields or a natural-language prompt.

use anyhow::{Context, Result};
use chrono::{Datelike, NaiveDate, NaiveTime, Timelike};
use tusk_core::tasks::{DueDate, Priority, PromptDraft, PromptOutcome, TaskDraft, TaskFlow};

use super::{api_client, prompt_line, render_flow_error};

pub async fn new_task(
    title: &str,
    description: &str,
    priority: &str,
    date: Option<String>,
    time: Option<String>,
    kind: Option<String>,
) -> Result<()> {
    let priority: Priority = priority
        .parse()
        .map_err(|e: String| anyhow::anyhow!(e))?;
    let due = parse_due(date.as_deref(), time.as_deref())?;

    let draft = TaskDraft {
        title: title.to_string(),
        description: description.to_string(),
        priority,
        due,
        kind,
        ..Default::default()
    };

    let client = api_client()?;
    let task = TaskFlow::new(&client)
        .create_task(&draft)
        .await
        .map_err(render_flow_error)?;

    println!("Created task \"{}\".", task.title);
    Ok(())
}

pub async fn from_prompt(prompt: String) -> Result<()> {
    let client = api_client()?;
    let flow = TaskFlow::new(&client);

    let mut draft = PromptDraft {
        prompt,
        previous_prompt: None,
    };

    // The server may ask for more detail; loop until it creates the task or
    // the user gives up with an empty line.
    loop {
        let outcome = flow
            .create_from_prompt(&draft)
            .await
            .map_err(render_flow_error)?;

        match outcome {
            PromptOutcome::Created(task) => {
                println!("Created task \"{}\".", task.title);
                return Ok(());
            }
            PromptOutcome::NeedsDetails(message) => {
                println!("{message}");
                let refined = prompt_line("More details (blank to cancel): ")?;
                if refined.is_empty() {
                    anyhow::bail!("Cancelled.");
                }
                draft.previous_prompt = Some(draft.prompt);
                draft.prompt = refined;
            }
        }
    }
}

/// Combines `--date YYYY-MM-DD` and `--time HH:MM` into a due date.
/// Both must be given together or omitted together.
fn parse_due(date: Option<&str>, time: Option<&str>) -> Result<Option<DueDate>> {
    let (date, time) = match (date, time) {
        (None, None) => return Ok(None),
        (Some(d), Some(t)) => (d, t),
        _ => anyhow::bail!("--date and --time must be used together."),
    };

    let d = NaiveDate::parse_from_str(date, "%Y-%m-%d")
        .with_context(|| format!("Invalid date {date:?}, expected YYYY-MM-DD"))?;
    let t = NaiveTime::parse_from_str(time, "%H:%M")
        .with_context(|| format!("Invalid time {time:?}, expected HH:MM"))?;

    Ok(Some(DueDate {
        year: d.year(),
        month: d.month(),
        day: d.day(),
        hour: t.hour(),
        minute: t.minute(),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Test: date and time parse into the due-date fields.
    #[test]
    fn test_parse_due_valid() {
        let due = parse_due(Some("2026-08-26"), Some("09:05")).unwrap().unwrap();
        assert_eq!((due.year, due.month, due.day), (2026, 8, 26));
        assert_eq!((due.hour, due.minute), (9, 5));
    }

    /// Test: both flags omitted means no due date.
    #[test]
    fn test_parse_due_omitted() {
        assert_eq!(parse_due(None, None).unwrap(), None);
    }

    /// Test: giving only one of the two flags is an error.
    #[test]
    fn test_parse_due_requires_both() {
        assert!(parse_due(Some("2026-08-26"), None).is_err());
        assert!(parse_due(None, Some("09:05")).is_err());
    }

    /// Test: malformed values are rejected with context.
    #[test]
    fn test_parse_due_malformed() {
        assert!(parse_due(Some("26/08/2026"), Some("09:05")).is_err());
        assert!(parse_due(Some("2026-08-26"), Some("9am")).is_err());
    }
}
