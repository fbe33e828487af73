//! Lifecycle manager tests: full create/start/stop/delete/list/get
//! flows against a real temp-dir store and a supervisor double.

#![allow(clippy::expect_used)]

use hivemind_cli::config::ManagerConfig;
use hivemind_cli::manager::AgentManager;
use hivemind_common::{LifecycleError, SupervisorEntry, SupervisorState};
use tempfile::TempDir;

use crate::helpers::{agent_config, owned_agent_config};
use crate::mocks::{Behavior, MockSupervisor, StatusBehavior};

fn manager<'a>(
    root: &TempDir,
    supervisor: &'a MockSupervisor,
) -> AgentManager<&'a MockSupervisor> {
    AgentManager::new(&ManagerConfig::with_root(root.path()), supervisor)
}

fn running(program: &str, pid: u32) -> SupervisorEntry {
    SupervisorEntry {
        program: program.to_string(),
        state: SupervisorState::Running,
        pid: Some(pid),
    }
}

// ── create ────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn create_writes_both_artifacts() {
    let root = TempDir::new().expect("tempdir");
    let supervisor = MockSupervisor::default();
    let manager = manager(&root, &supervisor);

    let created = manager
        .create(&agent_config("bot1"))
        .await
        .expect("create succeeds");

    assert!(std::path::Path::new(&created.spec_path).is_file());
    assert!(std::path::Path::new(&created.stanza_path).is_file());
    assert!(created.spec_path.ends_with("bot1_agent.json"));
    assert!(created.stanza_path.ends_with("bot1.conf"));
    // Creation never talks to supervisord.
    assert!(supervisor.recorded().is_empty());
}

#[tokio::test]
async fn duplicate_create_is_a_conflict() {
    let root = TempDir::new().expect("tempdir");
    let supervisor = MockSupervisor::default();
    let manager = manager(&root, &supervisor);

    manager
        .create(&agent_config("bot1"))
        .await
        .expect("first create succeeds");
    let err = manager
        .create(&agent_config("bot1"))
        .await
        .expect_err("second create fails");
    assert!(matches!(err, LifecycleError::Conflict { .. }));
}

#[tokio::test]
async fn same_name_under_different_owners_coexists() {
    let root = TempDir::new().expect("tempdir");
    let supervisor = MockSupervisor::default();
    let manager = manager(&root, &supervisor);

    manager
        .create(&owned_agent_config("alice", "bot1"))
        .await
        .expect("alice's bot1");
    manager
        .create(&owned_agent_config("bob", "bot1"))
        .await
        .expect("bob's bot1");
    manager
        .create(&agent_config("bot1"))
        .await
        .expect("unowned bot1");
}

#[tokio::test]
async fn uppercase_name_is_rejected() {
    let root = TempDir::new().expect("tempdir");
    let supervisor = MockSupervisor::default();
    let manager = manager(&root, &supervisor);

    let err = manager
        .create(&agent_config("Bot1"))
        .await
        .expect_err("invalid name fails");
    assert!(matches!(err, LifecycleError::InvalidName(_)));
}

// ── start ─────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn start_syncs_then_starts_then_queries() {
    let root = TempDir::new().expect("tempdir");
    let supervisor = MockSupervisor::with_status(vec![running("bot1_agent", 4711)]);
    let manager = manager(&root, &supervisor);

    manager
        .create(&agent_config("bot1"))
        .await
        .expect("create succeeds");
    let started = manager.start(None, "bot1").await.expect("start succeeds");

    assert_eq!(started.status, SupervisorState::Running);
    assert_eq!(
        supervisor.recorded(),
        vec!["reread", "update", "start bot1_agent", "status bot1_agent"]
    );
}

#[tokio::test]
async fn start_with_missing_stanza_is_not_found() {
    let root = TempDir::new().expect("tempdir");
    let supervisor = MockSupervisor::default();
    let manager = manager(&root, &supervisor);

    manager
        .create(&agent_config("bot1"))
        .await
        .expect("create succeeds");
    let stanza = root
        .path()
        .join("agents")
        .join("supervisor")
        .join("bot1.conf");
    std::fs::remove_file(&stanza).expect("stanza removed by hand");

    let err = manager
        .start(None, "bot1")
        .await
        .expect_err("start fails without the stanza");
    assert!(matches!(err, LifecycleError::NotFound { .. }));
    assert!(supervisor.recorded().is_empty());
}

#[tokio::test]
async fn start_without_artifacts_never_contacts_supervisord() {
    let root = TempDir::new().expect("tempdir");
    let supervisor = MockSupervisor::default();
    let manager = manager(&root, &supervisor);

    let err = manager
        .start(None, "ghost")
        .await
        .expect_err("start of unknown agent fails");
    assert!(matches!(err, LifecycleError::NotFound { .. }));
    assert!(supervisor.recorded().is_empty());
}

#[tokio::test]
async fn failed_update_is_a_sync_failure_with_status_dump() {
    let root = TempDir::new().expect("tempdir");
    let supervisor = MockSupervisor {
        update: Behavior::Fail {
            code: 2,
            stderr: "CANT_REREAD".to_string(),
        },
        status: StatusBehavior::Entries(vec![running("other_agent", 99)]),
        ..MockSupervisor::default()
    };
    let manager = manager(&root, &supervisor);

    manager
        .create(&agent_config("bot1"))
        .await
        .expect("create succeeds");
    let err = manager
        .start(None, "bot1")
        .await
        .expect_err("start fails on update");
    match err {
        LifecycleError::SupervisorSyncFailed { detail, .. } => {
            assert!(detail.contains("update"), "detail names the stage: {detail}");
            assert!(
                detail.contains("other_agent RUNNING"),
                "detail carries the status dump: {detail}"
            );
        }
        other => panic!("expected SupervisorSyncFailed, got {other:?}"),
    }
}

#[tokio::test]
async fn failed_start_carries_program_dump() {
    let root = TempDir::new().expect("tempdir");
    let supervisor = MockSupervisor {
        start: Behavior::Fail {
            code: 1,
            stderr: "spawn error".to_string(),
        },
        status: StatusBehavior::Entries(vec![running("other_agent", 99)]),
        ..MockSupervisor::default()
    };
    let manager = manager(&root, &supervisor);

    manager
        .create(&agent_config("bot1"))
        .await
        .expect("create succeeds");
    let err = manager
        .start(None, "bot1")
        .await
        .expect_err("start fails");
    match err {
        LifecycleError::StartFailed {
            program, detail, ..
        } => {
            assert_eq!(program, "bot1_agent");
            assert!(detail.contains("other_agent RUNNING"));
        }
        other => panic!("expected StartFailed, got {other:?}"),
    }
}

#[tokio::test]
async fn unreachable_supervisord_is_not_misreported_as_start_failure() {
    let root = TempDir::new().expect("tempdir");
    let supervisor = MockSupervisor {
        reread: Behavior::Unavailable,
        ..MockSupervisor::default()
    };
    let manager = manager(&root, &supervisor);

    manager
        .create(&agent_config("bot1"))
        .await
        .expect("create succeeds");
    let err = manager.start(None, "bot1").await.expect_err("start fails");
    assert!(matches!(err, LifecycleError::Supervisor(_)));
}

#[tokio::test]
async fn create_after_delete_succeeds() {
    let root = TempDir::new().expect("tempdir");
    let supervisor = MockSupervisor::default();
    let manager = manager(&root, &supervisor);

    manager
        .create(&agent_config("bot1"))
        .await
        .expect("first create succeeds");
    manager.delete(None, "bot1").await.expect("delete succeeds");
    manager
        .create(&agent_config("bot1"))
        .await
        .expect("create after delete succeeds");
}

// ── stop ──────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn stopped_worker_is_observed_as_stopped() {
    let root = TempDir::new().expect("tempdir");
    let supervisor = MockSupervisor::with_status(vec![SupervisorEntry {
        program: "bot1_agent".to_string(),
        state: SupervisorState::Stopped,
        pid: None,
    }]);
    let manager = manager(&root, &supervisor);

    manager
        .create(&agent_config("bot1"))
        .await
        .expect("create succeeds");
    manager.stop(None, "bot1").await.expect("stop succeeds");

    let details = manager.get(None, "bot1").await.expect("get succeeds");
    assert_eq!(details.status, SupervisorState::Stopped);
    assert!(!details.status.is_active());
}

#[tokio::test]
async fn stop_failure_carries_program_name() {
    let root = TempDir::new().expect("tempdir");
    let supervisor = MockSupervisor {
        stop: Behavior::Fail {
            code: 1,
            stderr: "NOT_RUNNING".to_string(),
        },
        ..MockSupervisor::default()
    };
    let manager = manager(&root, &supervisor);

    let err = manager
        .stop(Some("alice"), "bot1")
        .await
        .expect_err("stop fails");
    match err {
        LifecycleError::StopFailed { program, .. } => {
            assert_eq!(program, "alice_bot1_agent");
        }
        other => panic!("expected StopFailed, got {other:?}"),
    }
}

// ── delete ────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn delete_removes_artifacts_despite_failed_stop() {
    let root = TempDir::new().expect("tempdir");
    let supervisor = MockSupervisor {
        stop: Behavior::Fail {
            code: 1,
            stderr: "NOT_RUNNING".to_string(),
        },
        ..MockSupervisor::default()
    };
    let manager = manager(&root, &supervisor);

    let created = manager
        .create(&agent_config("bot1"))
        .await
        .expect("create succeeds");
    manager.delete(None, "bot1").await.expect("delete succeeds");

    assert!(!std::path::Path::new(&created.spec_path).exists());
    assert!(!std::path::Path::new(&created.stanza_path).exists());
    assert_eq!(
        supervisor.recorded(),
        vec!["stop bot1_agent", "reread", "update"]
    );
}

#[tokio::test]
async fn delete_of_absent_agent_succeeds() {
    let root = TempDir::new().expect("tempdir");
    let supervisor = MockSupervisor::default();
    let manager = manager(&root, &supervisor);

    manager
        .delete(None, "never-created")
        .await
        .expect("idempotent delete");
}

// ── list ──────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn list_merges_filesystem_and_supervisor_views() {
    let root = TempDir::new().expect("tempdir");
    let supervisor = MockSupervisor::with_status(vec![
        running("bot1_agent", 4711),
        // Registration without any artifact file.
        SupervisorEntry {
            program: "ghost_agent".to_string(),
            state: SupervisorState::Stopped,
            pid: None,
        },
    ]);
    let manager = manager(&root, &supervisor);

    manager
        .create(&agent_config("bot1"))
        .await
        .expect("bot1 created");
    manager
        .create(&agent_config("bot2"))
        .await
        .expect("bot2 created");

    let summaries = manager.list(None).await.expect("list succeeds");
    assert_eq!(summaries.len(), 3);

    let bot1 = &summaries[0];
    assert_eq!(bot1.agent, "bot1");
    assert!(bot1.file_exists);
    assert!(bot1.is_active);
    assert_eq!(bot1.pid, Some(4711));

    let bot2 = &summaries[1];
    assert_eq!(bot2.agent, "bot2");
    assert!(bot2.file_exists);
    assert!(!bot2.is_active);
    assert_eq!(bot2.status, SupervisorState::NotConfigured);

    let ghost = &summaries[2];
    assert_eq!(ghost.agent, "ghost");
    assert!(!ghost.file_exists);
    assert_eq!(ghost.status, SupervisorState::Stopped);
}

#[tokio::test]
async fn list_filters_by_owner() {
    let root = TempDir::new().expect("tempdir");
    let supervisor = MockSupervisor::default();
    let manager = manager(&root, &supervisor);

    manager
        .create(&owned_agent_config("alice", "bot1"))
        .await
        .expect("alice's bot1");
    manager
        .create(&owned_agent_config("bob", "bot2"))
        .await
        .expect("bob's bot2");

    let summaries = manager.list(Some("alice")).await.expect("list succeeds");
    assert_eq!(summaries.len(), 1);
    assert_eq!(summaries[0].agent, "alice/bot1");
}

#[tokio::test]
async fn list_rejects_an_owner_filter_that_is_not_a_valid_name() {
    let root = TempDir::new().expect("tempdir");
    let supervisor = MockSupervisor::default();
    let manager = manager(&root, &supervisor);

    // Owner filters become path components; the name rule applies to
    // them exactly as it does in every other operation.
    for owner in ["../outside", "my_owner", "Alice", "agents"] {
        let err = manager
            .list(Some(owner))
            .await
            .expect_err("invalid owner filter fails");
        assert!(
            matches!(err, LifecycleError::InvalidName(_)),
            "owner {owner:?} should be rejected"
        );
    }
}

#[tokio::test]
async fn list_degrades_when_supervisord_is_unreachable() {
    let root = TempDir::new().expect("tempdir");
    let supervisor = MockSupervisor {
        status: StatusBehavior::Unavailable,
        ..MockSupervisor::default()
    };
    let manager = manager(&root, &supervisor);

    manager
        .create(&agent_config("bot1"))
        .await
        .expect("create succeeds");
    let summaries = manager.list(None).await.expect("list still succeeds");
    assert_eq!(summaries.len(), 1);
    assert_eq!(summaries[0].status, SupervisorState::NotConfigured);
}

// ── get ───────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn get_reports_not_configured_before_first_start() {
    let root = TempDir::new().expect("tempdir");
    let supervisor = MockSupervisor::default();
    let manager = manager(&root, &supervisor);

    manager
        .create(&agent_config("bot1"))
        .await
        .expect("create succeeds");
    let details = manager.get(None, "bot1").await.expect("get succeeds");

    assert_eq!(details.status, SupervisorState::NotConfigured);
    assert!(details.exists);
    assert!(details.file.ends_with("bot1_agent.json"));
}

#[tokio::test]
async fn get_of_missing_agent_is_not_found() {
    let root = TempDir::new().expect("tempdir");
    let supervisor = MockSupervisor::default();
    let manager = manager(&root, &supervisor);

    let err = manager.get(None, "ghost").await.expect_err("get fails");
    assert!(matches!(err, LifecycleError::NotFound { .. }));
}

#[tokio::test]
async fn get_degrades_to_unknown_when_supervisord_is_unreachable() {
    let root = TempDir::new().expect("tempdir");
    let supervisor = MockSupervisor {
        status: StatusBehavior::Unavailable,
        ..MockSupervisor::default()
    };
    let manager = manager(&root, &supervisor);

    manager
        .create(&agent_config("bot1"))
        .await
        .expect("create succeeds");
    let details = manager.get(None, "bot1").await.expect("get succeeds");
    assert_eq!(details.status, SupervisorState::Unknown);
}
