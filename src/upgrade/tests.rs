#[cfg(test)]
#[allow(clippy::module_inception)]
mod tests {
    use super::super::*;
    use crate::core::{UpdateError, UpdateOutcome};
    use crate::test_utils::{init_test_logging, snapshot_tree, write_tree};
    use crate::utils::fs::classify_move_error;
    use std::cell::{Cell, RefCell};
    use std::io;
    use std::path::{Path, PathBuf};
    use std::rc::Rc;
    use std::time::Duration;
    use tempfile::TempDir;

    type EventLog = Rc<RefCell<Vec<String>>>;

    fn name(path: &Path) -> String {
        path.file_name().map(|n| n.to_string_lossy().into_owned()).unwrap_or_default()
    }

    struct RecordingControl {
        log: EventLog,
        running: Cell<bool>,
        kill_error: Option<io::ErrorKind>,
    }

    impl ProcessControl for RecordingControl {
        fn is_running(&self, _pid: u32) -> bool {
            self.running.get()
        }

        fn terminate(&self, pid: u32) -> io::Result<()> {
            self.log.borrow_mut().push(format!("terminate {pid}"));
            match self.kill_error {
                Some(kind) => Err(io::Error::from(kind)),
                None => {
                    self.running.set(false);
                    Ok(())
                }
            }
        }
    }

    struct RecordingMover {
        log: EventLog,
        deny_from: Option<PathBuf>,
        /// 1-based index of the `remove` call that is refused.
        deny_remove: Option<usize>,
        removes: Cell<usize>,
    }

    impl DirectoryMover for RecordingMover {
        fn move_dir(&self, from: &Path, to: &Path) -> Result<(), UpdateError> {
            self.log.borrow_mut().push(format!("move {} -> {}", name(from), name(to)));
            if self.deny_from.as_deref() == Some(from) {
                return Err(classify_move_error(from, to, io::Error::from(io::ErrorKind::PermissionDenied)));
            }
            FsMover.move_dir(from, to)
        }

        fn remove(&self, path: &Path) -> Result<(), UpdateError> {
            self.log.borrow_mut().push(format!("remove {}", name(path)));
            self.removes.set(self.removes.get() + 1);
            if self.deny_remove == Some(self.removes.get()) {
                return Err(UpdateError::InsufficientDeletePermissions {
                    path: path.to_path_buf(),
                    source: io::Error::from(io::ErrorKind::PermissionDenied),
                });
            }
            FsMover.remove(path)
        }
    }

    #[derive(Default)]
    struct RecordingLauncher {
        launched: RefCell<Vec<UpdateOutcome>>,
        fail: bool,
    }

    impl Launcher for RecordingLauncher {
        fn launch(&self, outcome: UpdateOutcome) -> anyhow::Result<()> {
            self.launched.borrow_mut().push(outcome);
            if self.fail {
                anyhow::bail!("launcher not found");
            }
            Ok(())
        }
    }

    struct Scenario {
        _temp: TempDir,
        log: EventLog,
        request: UpdateRequest,
    }

    impl Scenario {
        fn new() -> Self {
            init_test_logging(None);
            let temp = TempDir::new().unwrap();
            let new_install = temp.path().join("staged");
            let live_install = temp.path().join("current");
            write_tree(&new_install, &[("launcher", "2.0"), ("assets/new.pak", "new")]);
            write_tree(&live_install, &[("launcher", "1.0"), ("saves/slot1.sav", "progress")]);

            Self {
                _temp: temp,
                log: Rc::new(RefCell::new(Vec::new())),
                request: UpdateRequest { new_install, live_install, pid: 4242 },
            }
        }

        fn control(&self, running: bool, kill_error: Option<io::ErrorKind>) -> RecordingControl {
            RecordingControl { log: self.log.clone(), running: Cell::new(running), kill_error }
        }

        fn mover(&self, deny_from: Option<PathBuf>) -> RecordingMover {
            RecordingMover {
                log: self.log.clone(),
                deny_from,
                deny_remove: None,
                removes: Cell::new(0),
            }
        }

        fn mover_denying_remove(&self, call: usize) -> RecordingMover {
            RecordingMover { deny_remove: Some(call), ..self.mover(None) }
        }

        fn run(
            &self,
            control: RecordingControl,
            mover: RecordingMover,
            launcher: &RecordingLauncher,
        ) -> RunReport {
            let waiter = ProcessWaiter::with_control(control, Duration::from_millis(20))
                .poll_interval(Duration::from_millis(5))
                .kill_settle(Duration::from_millis(10));
            UpdateOrchestrator::with_parts(waiter, mover).run(&self.request, launcher)
        }

        fn events(&self) -> Vec<String> {
            self.log.borrow().clone()
        }
    }

    #[test]
    fn test_successful_update() {
        let scenario = Scenario::new();
        let live_before = snapshot_tree(&scenario.request.live_install);
        let launcher = RecordingLauncher::default();

        let report = scenario.run(scenario.control(false, None), scenario.mover(None), &launcher);

        assert_eq!(report.outcome, UpdateOutcome::Success);
        assert!(report.error.is_none());
        assert_eq!(report.exit_code(), 0);
        assert_eq!(*launcher.launched.borrow(), vec![UpdateOutcome::Success]);
        assert_eq!(snapshot_tree(&scenario.request.new_install), live_before);
        assert!(!scenario.request.live_install.exists());
        assert_eq!(
            scenario.events(),
            vec![
                "remove staged_backup",
                "move staged -> staged_backup",
                "move current -> staged",
                "remove staged_backup",
            ]
        );
    }

    #[test]
    fn test_invalid_arguments_touch_nothing() {
        let mut scenario = Scenario::new();
        scenario.request.live_install = PathBuf::from("relative/current");
        let new_before = snapshot_tree(&scenario.request.new_install);
        let launcher = RecordingLauncher::default();

        let report = scenario.run(scenario.control(true, None), scenario.mover(None), &launcher);

        assert_eq!(report.outcome, UpdateOutcome::InvalidArguments);
        assert_eq!(report.exit_code(), 1);
        assert!(scenario.events().is_empty());
        assert_eq!(snapshot_tree(&scenario.request.new_install), new_before);
        assert_eq!(*launcher.launched.borrow(), vec![UpdateOutcome::InvalidArguments]);
    }

    #[test]
    fn test_kill_failure_stops_before_file_operations() {
        let scenario = Scenario::new();
        let live_before = snapshot_tree(&scenario.request.live_install);
        let launcher = RecordingLauncher::default();

        let report = scenario.run(
            scenario.control(true, Some(io::ErrorKind::PermissionDenied)),
            scenario.mover(None),
            &launcher,
        );

        assert_eq!(report.outcome, UpdateOutcome::KillFailure);
        let error = report.error.as_ref().unwrap();
        assert_eq!(format!("{error:#}"), "Unable to kill process 4242: permission denied");
        assert_eq!(scenario.events(), vec!["terminate 4242"]);
        assert_eq!(snapshot_tree(&scenario.request.live_install), live_before);
        assert_eq!(*launcher.launched.borrow(), vec![UpdateOutcome::KillFailure]);
    }

    #[test]
    fn test_stubborn_process_killed_before_swap() {
        let scenario = Scenario::new();
        let launcher = RecordingLauncher::default();

        let report = scenario.run(scenario.control(true, None), scenario.mover(None), &launcher);

        assert_eq!(report.outcome, UpdateOutcome::Success);
        let events = scenario.events();
        assert_eq!(events.first().map(String::as_str), Some("terminate 4242"));
        assert_eq!(events.len(), 5, "{events:?}");
    }

    #[test]
    fn test_denied_cutover_restores_and_reports() {
        let scenario = Scenario::new();
        let new_before = snapshot_tree(&scenario.request.new_install);
        let live_before = snapshot_tree(&scenario.request.live_install);
        let launcher = RecordingLauncher::default();
        let mover = scenario.mover(Some(scenario.request.live_install.clone()));

        let report = scenario.run(scenario.control(false, None), mover, &launcher);

        assert_eq!(report.outcome, UpdateOutcome::MovePermissionFailure);
        assert_eq!(report.exit_code(), 4);
        assert_eq!(snapshot_tree(&scenario.request.new_install), new_before);
        assert_eq!(snapshot_tree(&scenario.request.live_install), live_before);
        assert!(!crate::utils::fs::with_name_suffix(&scenario.request.new_install, "_backup").exists());
        assert_eq!(
            scenario.events().last().map(String::as_str),
            Some("move staged_backup -> staged")
        );
        assert_eq!(*launcher.launched.borrow(), vec![UpdateOutcome::MovePermissionFailure]);
    }

    #[test]
    fn test_stale_backup_delete_denied_leaves_live_untouched() {
        let scenario = Scenario::new();
        let new_before = snapshot_tree(&scenario.request.new_install);
        let live_before = snapshot_tree(&scenario.request.live_install);
        let launcher = RecordingLauncher::default();

        let report = scenario.run(scenario.control(false, None), scenario.mover_denying_remove(1), &launcher);

        assert_eq!(report.outcome, UpdateOutcome::DeletePermissionFailure);
        assert_eq!(report.exit_code(), 3);
        assert_eq!(scenario.events(), vec!["remove staged_backup"]);
        assert_eq!(snapshot_tree(&scenario.request.new_install), new_before);
        assert_eq!(snapshot_tree(&scenario.request.live_install), live_before);
        assert_eq!(*launcher.launched.borrow(), vec![UpdateOutcome::DeletePermissionFailure]);
    }

    #[test]
    fn test_final_backup_delete_denied_reports_delete_failure() {
        let scenario = Scenario::new();
        let live_before = snapshot_tree(&scenario.request.live_install);
        let launcher = RecordingLauncher::default();

        let report = scenario.run(scenario.control(false, None), scenario.mover_denying_remove(2), &launcher);

        assert_eq!(report.outcome, UpdateOutcome::DeletePermissionFailure);
        assert_eq!(snapshot_tree(&scenario.request.new_install), live_before);
        assert!(matches!(
            report.error.as_ref().and_then(|e| e.downcast_ref::<UpdateError>()),
            Some(UpdateError::InsufficientDeletePermissions { .. })
        ));
        assert_eq!(*launcher.launched.borrow(), vec![UpdateOutcome::DeletePermissionFailure]);
    }

    #[test]
    fn test_missing_new_install_reports_directory_missing() {
        let scenario = Scenario::new();
        std::fs::remove_dir_all(&scenario.request.new_install).unwrap();
        let launcher = RecordingLauncher::default();

        let report = scenario.run(scenario.control(false, None), scenario.mover(None), &launcher);

        assert_eq!(report.outcome, UpdateOutcome::DirectoryMissingFailure);
        assert!(scenario.request.live_install.join("launcher").exists());
    }

    #[test]
    fn test_relaunch_failure_overrides_exit_code() {
        let scenario = Scenario::new();
        let launcher = RecordingLauncher { fail: true, ..Default::default() };

        let report = scenario.run(scenario.control(false, None), scenario.mover(None), &launcher);

        assert_eq!(report.outcome, UpdateOutcome::Success);
        assert!(report.relaunch_error.is_some());
        assert_eq!(report.exit_code(), RELAUNCH_FAILURE_EXIT_CODE);
        assert_eq!(launcher.launched.borrow().len(), 1);
    }
}
