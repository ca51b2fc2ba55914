use exams_core::{EmitMessage, JobConfig, ProgressUpdate, Summary};
use pretty_assertions::assert_eq;
use serde_json::json;

#[test]
fn frames_are_tagged_by_kind() {
    let frames = [
        (EmitMessage::info("hello"), json!({"kind": "info", "msg": "hello"})),
        (EmitMessage::dry_run("a/b.pdf"), json!({"kind": "dryrun", "msg": "a/b.pdf"})),
        (EmitMessage::Ping, json!({"kind": "ping"})),
        (
            EmitMessage::Progress(ProgressUpdate::Transfer { done: 3, total: 9 }),
            json!({"kind": "progress", "done": 3, "total": 9}),
        ),
        (
            EmitMessage::Progress(ProgressUpdate::Scanned { scanned: 4 }),
            json!({"kind": "progress", "scanned": 4}),
        ),
    ];
    for (message, expected) in frames {
        assert_eq!(serde_json::to_value(&message).unwrap(), expected);
    }
}

#[test]
fn done_frame_uses_short_count_names() {
    let done = EmitMessage::Done(Summary {
        downloaded: 1,
        skipped: 2,
        failed: 3,
        dryrun: 4,
        fatal: false,
    });
    assert_eq!(
        serde_json::to_value(&done).unwrap(),
        json!({"kind": "done", "dl": 1, "skip": 2, "fail": 3, "dry": 4})
    );

    let fatal = EmitMessage::Done(Summary::fatal());
    assert_eq!(
        serde_json::to_value(&fatal).unwrap(),
        json!({"kind": "done", "dl": 0, "skip": 0, "fail": 0, "dry": 0, "fatal": true})
    );
}

#[test]
fn start_payload_defaults_and_aliases() {
    let config: JobConfig = serde_json::from_str("{}").unwrap();
    assert_eq!(config, JobConfig::default());

    let config: JobConfig = serde_json::from_value(json!({
        "grades": ["12"],
        "years": ["2024"],
        "output_dir": "  ",
        "dry_run": true,
        "threads": 50
    }))
    .unwrap();
    assert_eq!(config.grades, vec!["12".to_string()]);
    assert_eq!(config.output_root, std::path::PathBuf::from("downloads"));
    assert!(config.dry_run);
    assert_eq!(config.worker_count(), 10);
}
