// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::clock::FakeClock;
use crate::config::ScheduleConfig;
use crate::job::{callable, RecordingJob};
use crate::process::FakeProcessSpawner;
use chrono::NaiveDate;
use serde_json::json;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use tempfile::TempDir;
use yare::parameterized;

fn at(y: i32, mo: u32, d: u32, h: u32, mi: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(y, mo, d)
        .unwrap()
        .and_hms_opt(h, mi, 0)
        .unwrap()
}

fn context(dir: &TempDir) -> (Context, FakeProcessSpawner) {
    let spawner = FakeProcessSpawner::new();
    let ctx = Context::new(
        ScheduleConfig::new().with_lock_dir(dir.path()),
        Arc::new(spawner.clone()),
    )
    .with_clock(Arc::new(FakeClock::at(at(2024, 1, 8, 10, 0))))
    .with_directory(dir.path());
    (ctx, spawner)
}

fn counter() -> (Arc<AtomicUsize>, Callable) {
    let hits = Arc::new(AtomicUsize::new(0));
    let inner = Arc::clone(&hits);
    let call = callable(move |_| {
        inner.fetch_add(1, Ordering::SeqCst);
        Ok(())
    });
    (hits, call)
}

// ----------------------------------------------------------------------
// Identity
// ----------------------------------------------------------------------

#[test]
fn id_ignores_schedule_and_policy() {
    let plain = Event::command("php artisan inspire", vec![]);
    let mut tuned = Event::command("php artisan inspire", vec![]);
    tuned.daily().limit(3).run_in_background().description("inspire");

    assert_eq!(plain.id(), tuned.id());
}

#[test]
fn id_depends_on_arguments() {
    let a = Event::command("backup", vec![json!("--full")]);
    let b = Event::command("backup", vec![json!("--fast")]);
    assert_ne!(a.id(), b.id());
}

#[test]
fn job_id_uses_job_name() {
    let a = Event::job(Arc::new(RecordingJob::new("reports")), vec![]);
    let b = Event::job(Arc::new(RecordingJob::new("reports")), vec![]);
    let c = Event::job(Arc::new(RecordingJob::new("mailer")), vec![]);
    assert_eq!(a.id(), b.id());
    assert_ne!(a.id(), c.id());
}

// ----------------------------------------------------------------------
// Cron helpers
// ----------------------------------------------------------------------

#[parameterized(
    every_minute = { Event::every_minute, "* * * * *" },
    every_five = { Event::every_five_minutes, "*/5 * * * *" },
    every_ten = { Event::every_ten_minutes, "*/10 * * * *" },
    every_fifteen = { Event::every_fifteen_minutes, "*/15 * * * *" },
    every_twenty = { Event::every_twenty_minutes, "*/20 * * * *" },
    every_thirty = { Event::every_thirty_minutes, "*/30 * * * *" },
    hourly = { Event::hourly, "0 * * * *" },
    daily = { Event::daily, "0 0 * * *" },
    weekly = { Event::weekly, "0 0 * * 0" },
    monthly = { Event::monthly, "0 0 1 * *" },
    quarterly = { Event::quarterly, "0 0 1 */3 *" },
    yearly = { Event::yearly, "0 0 1 1 *" },
    weekdays = { Event::weekdays, "* * * * 1-5" },
    weekends = { Event::weekends, "* * * * 0,6" },
    mondays = { Event::mondays, "* * * * 1" },
    saturdays = { Event::saturdays, "* * * * 6" },
)]
fn helper_sets_segments(helper: fn(&mut Event) -> &mut Event, expected: &str) {
    let mut event = Event::command("true", vec![]);
    helper(&mut event);
    assert_eq!(event.expression(), expected);
}

#[test]
fn helpers_compose() {
    let mut event = Event::command("true", vec![]);
    event.weekdays().at(9, 30);
    assert_eq!(event.expression(), "30 9 * * 1-5");

    event.between(8, 17);
    assert_eq!(event.expression(), "30 8-17 * * 1-5");
}

#[test]
fn every_n_minutes_resets_other_segments() {
    let mut event = Event::command("true", vec![]);
    event.daily().weekdays().every_fifteen_minutes();
    assert_eq!(event.expression(), "*/15 * * * *");
}

#[test]
fn cron_replaces_all_segments() {
    let mut event = Event::command("true", vec![]);
    event.cron("5 4 * * 0").unwrap();
    assert_eq!(event.expression(), "5 4 * * 0");
}

#[parameterized(
    too_few = { "* * * *", 4 },
    too_many = { "* * * * * *", 6 },
    empty = { "", 0 },
)]
fn cron_rejects_wrong_field_count(expression: &str, found: usize) {
    let mut event = Event::command("true", vec![]);
    let err = event.cron(expression).unwrap_err();
    assert_eq!(
        err,
        CronError::FieldCount {
            expression: expression.to_string(),
            found
        }
    );
    assert_eq!(event.expression(), "* * * * *");
}

#[test]
fn is_due_matches_expression() {
    let mut event = Event::command("true", vec![]);
    event.at(10, 0);

    assert!(event.is_due(at(2024, 1, 8, 10, 0)).unwrap());
    assert!(!event.is_due(at(2024, 1, 8, 10, 1)).unwrap());
}

#[test]
fn is_due_surfaces_bad_segments() {
    let mut event = Event::command("true", vec![]);
    event.cron("61 * * * *").unwrap();
    assert!(event.is_due(at(2024, 1, 8, 10, 0)).is_err());
}

// ----------------------------------------------------------------------
// Command lines
// ----------------------------------------------------------------------

#[test]
fn command_line_quotes_arguments() {
    let event = Event::command("report", vec![json!("two words"), json!(3), json!("plain")]);
    assert_eq!(
        event.command_line().unwrap(),
        "report 'two words' 3 plain"
    );
}

#[test]
fn command_line_redirects_output() {
    let mut event = Event::command("report", vec![]);
    event.output("/var/log/report.log");
    assert_eq!(
        event.command_line().unwrap(),
        "report > /var/log/report.log 2>&1"
    );

    event.append_output("/var/log/report.log");
    assert_eq!(
        event.command_line().unwrap(),
        "report >> /var/log/report.log 2>&1"
    );
}

#[test]
fn command_line_is_an_error_for_callables() {
    let (_, call) = counter();
    assert!(matches!(
        Event::call("tick", call, vec![]).command_line(),
        Err(ScheduleError::NotACommand(_))
    ));
}

#[test]
fn unquotable_argument_is_rejected_not_spliced() {
    let event = Event::command("report", vec![json!("bad\0arg")]);
    assert!(matches!(
        event.command_line(),
        Err(ScheduleError::Unquotable(ref raw)) if raw == "bad\0arg"
    ));
}

// ----------------------------------------------------------------------
// Filters and hooks
// ----------------------------------------------------------------------

#[test]
fn filters_require_all_when_and_no_skip() {
    let mut event = Event::command("true", vec![]);
    assert!(event.passes_filters());

    event.when(|| true).when(|| true);
    assert!(event.passes_filters());

    event.skip(|| false);
    assert!(event.passes_filters());

    event.skip(|| true);
    assert!(!event.passes_filters());
}

#[tokio::test]
async fn filtered_event_runs_nothing() {
    let dir = TempDir::new().unwrap();
    let (ctx, spawner) = context(&dir);
    let mut event = Event::command("true", vec![]);
    event.when(|| false);

    assert_eq!(event.execute(&ctx).await.unwrap(), 0);
    assert!(spawner.started().is_empty());
}

#[tokio::test]
async fn hooks_run_in_order_around_launch() {
    let dir = TempDir::new().unwrap();
    let (ctx, _) = context(&dir);
    let log = Arc::new(Mutex::new(Vec::new()));

    let (l1, l2, l3, l4) = (
        Arc::clone(&log),
        Arc::clone(&log),
        Arc::clone(&log),
        Arc::clone(&log),
    );
    let mut event = Event::call(
        "work",
        callable(move |_| {
            l2.lock().unwrap().push("run");
            Ok(())
        }),
        vec![],
    );
    event
        .before(move || {
            l1.lock().unwrap().push("before");
            Ok(())
        })
        .after(move || {
            l3.lock().unwrap().push("after-1");
            Ok(())
        })
        .after(move || {
            l4.lock().unwrap().push("after-2");
            Ok(())
        });

    event.execute(&ctx).await.unwrap();

    assert_eq!(
        *log.lock().unwrap(),
        vec!["before", "run", "after-1", "after-2"]
    );
}

#[tokio::test]
async fn failing_before_hook_stops_the_run() {
    let dir = TempDir::new().unwrap();
    let (ctx, spawner) = context(&dir);
    let mut event = Event::command("true", vec![]);
    event.before(|| Err("not today".into()));

    let err = event.execute(&ctx).await.unwrap_err();
    assert!(matches!(err, ScheduleError::Hook { .. }));
    assert!(spawner.started().is_empty());
}

// ----------------------------------------------------------------------
// Execution
// ----------------------------------------------------------------------

#[tokio::test]
async fn command_is_started_and_recorded() {
    let dir = TempDir::new().unwrap();
    let (ctx, spawner) = context(&dir);
    let mut event = Event::command("echo", vec![json!("hi")]);
    event.in_directory("/srv").env("APP_ENV", "prod");

    assert_eq!(event.execute(&ctx).await.unwrap(), 1);

    let started = spawner.started();
    assert_eq!(started.len(), 1);
    assert_eq!(started[0].command, "echo hi");
    assert_eq!(started[0].options.cwd, Some(PathBuf::from("/srv")));
    assert_eq!(
        started[0].options.env,
        vec![("APP_ENV".to_string(), "prod".to_string())]
    );
    assert_eq!(
        event.pid_file(dir.path()).load(),
        vec![started[0].pid]
    );
    assert!(spawner.waited().is_empty());
}

#[tokio::test]
async fn waited_command_is_reaped_and_forgotten() {
    let dir = TempDir::new().unwrap();
    let (ctx, spawner) = context(&dir);
    let mut event = Event::command("sleep 1", vec![]);
    event.wait();

    event.execute(&ctx).await.unwrap();

    let pid = spawner.started()[0].pid;
    assert_eq!(spawner.waited(), vec![pid]);
    assert!(event.pid_file(dir.path()).load().is_empty());
}

#[tokio::test]
async fn processes_launches_count_times() {
    let dir = TempDir::new().unwrap();
    let (ctx, spawner) = context(&dir);
    let mut event = Event::command("worker", vec![]);
    event.processes(3);

    assert_eq!(event.execute(&ctx).await.unwrap(), 3);
    assert_eq!(spawner.started().len(), 3);
    assert_eq!(event.pid_file(dir.path()).load().len(), 3);
}

#[tokio::test]
async fn limit_caps_launches_within_a_tick() {
    let dir = TempDir::new().unwrap();
    let (ctx, spawner) = context(&dir);
    let mut event = Event::command("worker", vec![]);
    event.processes(5).limit(2);

    assert_eq!(event.execute(&ctx).await.unwrap(), 2);
    assert_eq!(spawner.started().len(), 2);
}

#[tokio::test]
async fn limit_counts_live_siblings_from_lock_file() {
    let dir = TempDir::new().unwrap();
    let (ctx, spawner) = context(&dir);
    let mut event = Event::command("worker", vec![]);
    event.limit(1);

    event.pid_file(dir.path()).save(&[12_345]).unwrap();
    spawner.set_alive(12_345);
    assert_eq!(event.execute(&ctx).await.unwrap(), 0);

    spawner.kill(12_345);
    assert_eq!(event.execute(&ctx).await.unwrap(), 1);
    assert!(!event.pid_file(dir.path()).load().contains(&12_345));
}

#[tokio::test]
async fn zero_limit_is_unlimited() {
    let dir = TempDir::new().unwrap();
    let (ctx, spawner) = context(&dir);
    let mut event = Event::command("worker", vec![]);
    event.limit(0);

    let siblings: Vec<u32> = (1..=10).collect();
    event.pid_file(dir.path()).save(&siblings).unwrap();
    for pid in &siblings {
        spawner.set_alive(*pid);
    }

    assert_eq!(event.execute(&ctx).await.unwrap(), 1);
}

#[tokio::test]
async fn callable_runs_in_process_with_arguments() {
    let dir = TempDir::new().unwrap();
    let (ctx, spawner) = context(&dir);
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&seen);
    let event = Event::call(
        "collect",
        callable(move |args| {
            sink.lock().unwrap().extend(args.iter().cloned());
            Ok(())
        }),
        vec![json!(1), json!("two")],
    );

    assert_eq!(event.execute(&ctx).await.unwrap(), 1);
    assert_eq!(*seen.lock().unwrap(), vec![json!(1), json!("two")]);
    assert!(spawner.started().is_empty());
    assert_eq!(
        event.pid_file(dir.path()).load(),
        vec![std::process::id()]
    );
}

#[tokio::test]
async fn own_pid_does_not_count_against_the_limit() {
    let dir = TempDir::new().unwrap();
    let (ctx, _) = context(&dir);
    let (hits, call) = counter();
    let mut event = Event::call("tick", call, vec![]);
    event.limit(1);

    event
        .pid_file(dir.path())
        .save(&[std::process::id()])
        .unwrap();

    assert_eq!(event.execute(&ctx).await.unwrap(), 1);
    assert_eq!(hits.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn job_is_dispatched_with_arguments() {
    let dir = TempDir::new().unwrap();
    let (ctx, _) = context(&dir);
    let job = RecordingJob::new("reports");
    let event = Event::job(Arc::new(job.clone()), vec![json!("weekly")]);

    event.execute(&ctx).await.unwrap();

    assert_eq!(job.calls(), vec![vec![json!("weekly")]]);
}

#[tokio::test]
async fn failing_job_propagates() {
    let dir = TempDir::new().unwrap();
    let (ctx, _) = context(&dir);
    let event = Event::job(Arc::new(RecordingJob::failing("reports", "boom")), vec![]);

    let err = event.execute(&ctx).await.unwrap_err();
    assert!(matches!(err, ScheduleError::Job { ref job, .. } if job == "reports"));
}

#[tokio::test]
async fn start_failure_propagates() {
    let dir = TempDir::new().unwrap();
    let (ctx, spawner) = context(&dir);
    spawner.fail_starts();

    let err = Event::command("true", vec![]).execute(&ctx).await.unwrap_err();
    assert!(matches!(err, ScheduleError::Process(_)));
}

// ----------------------------------------------------------------------
// Self invocation
// ----------------------------------------------------------------------

#[test]
fn self_invocation_keeps_id_and_policy() {
    let dir = TempDir::new().unwrap();
    let (ctx, _) = context(&dir);
    let ctx = Context {
        config: ctx.config.clone().with_runner("/usr/local/bin/origin"),
        ..ctx
    };
    let (_, call) = counter();
    let mut event = Event::call("tick", call, vec![json!(1)]);
    event.run_in_background().limit(2).output("/tmp/tick.log");
    let id = event.id().clone();

    event.into_self_invocation(&ctx).unwrap();

    assert!(event.is_command());
    assert!(event.is_self_invocation());
    assert_eq!(event.id(), &id);
    assert_eq!(event.max_processes(), 2);
    assert_eq!(
        event.command_line().unwrap(),
        format!(
            "/usr/local/bin/origin schedule:run --directory={} --id={} > /tmp/tick.log 2>&1",
            dir.path().display(),
            id
        )
    );
}
