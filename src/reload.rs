//! Hot reload of controllers.
//!
//! Tracks controller file modification times and detects changes. A change,
//! a new controller file or a deleted one triggers a rescan of the whole
//! application folder and a new artefact generation.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant, SystemTime};

use crate::artefacts::ControllerArtefacts;
use crate::controller::scanner::{controller_sources, load_application, LoadedApplication};
use crate::error::LoadError;
use crate::plugin::PluginManager;

/// Watches one application folder for controller changes.
pub struct ControllerWatcher {
    folder: PathBuf,
    /// Map from file path to last known modification time.
    files: HashMap<PathBuf, SystemTime>,
    /// Last time we checked for changes (throttling)
    last_check: Instant,
    check_interval: Duration,
}

impl ControllerWatcher {
    /// Watch `folder`, checking at most once per second.
    pub fn new(folder: &Path) -> Self {
        Self::with_check_interval(folder, Duration::from_secs(1))
    }

    pub fn with_check_interval(folder: &Path, interval: Duration) -> Self {
        Self {
            folder: folder.to_path_buf(),
            files: HashMap::new(),
            // Start in the past so the first check runs
            last_check: Instant::now()
                .checked_sub(interval)
                .unwrap_or_else(Instant::now),
            check_interval: interval,
        }
    }

    /// Start tracking every source of a freshly loaded application.
    pub fn track_application(&mut self, app: &LoadedApplication) {
        for path in &app.sources {
            self.track(path);
        }
    }

    /// Start tracking a file, recording its current modification time.
    pub fn track(&mut self, path: &Path) {
        if let Some(mtime) = modified(path) {
            self.files.insert(path.to_path_buf(), mtime);
        }
    }

    pub fn tracked_count(&self) -> usize {
        self.files.len()
    }

    pub fn folder(&self) -> &Path {
        &self.folder
    }

    /// Tracked files modified or deleted since the last check, plus controller
    /// files that appeared. Throttled: returns nothing until the check interval
    /// has elapsed.
    pub fn get_changed_files(&mut self) -> Result<Vec<PathBuf>, LoadError> {
        let now = Instant::now();
        if now.duration_since(self.last_check) < self.check_interval {
            return Ok(Vec::new());
        }
        self.last_check = now;

        let mut changed = Vec::new();
        for (path, last_mtime) in &self.files {
            match modified(path) {
                Some(mtime) if mtime > *last_mtime => changed.push(path.clone()),
                Some(_) => {}
                None => changed.push(path.clone()),
            }
        }

        for path in controller_sources(&self.folder)? {
            if !self.files.contains_key(&path) {
                changed.push(path);
            }
        }

        for path in &changed {
            match modified(path) {
                Some(mtime) => {
                    self.files.insert(path.clone(), mtime);
                }
                None => {
                    self.files.remove(path);
                }
            }
        }

        changed.sort();
        Ok(changed)
    }

    /// Rescan and reinitialize `artefacts` when any controller changed.
    ///
    /// Returns the new generation number, or `None` when nothing changed. On a
    /// load error the current generation stays in place.
    pub fn reload_if_changed(
        &mut self,
        artefacts: &ControllerArtefacts,
    ) -> Result<Option<u64>, LoadError> {
        let changed = self.get_changed_files()?;
        if changed.is_empty() {
            return Ok(None);
        }

        tracing::info!(files = changed.len(), "controller sources changed, reloading");
        for path in &changed {
            tracing::debug!(path = %path.display(), "changed");
        }

        let app = load_application(&self.folder)?;
        self.track_application(&app);
        let plugins: Arc<dyn PluginManager> = Arc::new(app.plugins);
        Ok(Some(artefacts.reinitialize(app.registry, Some(plugins))))
    }
}

impl std::fmt::Debug for ControllerWatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ControllerWatcher")
            .field("folder", &self.folder)
            .field("tracked", &self.files.len())
            .field("check_interval", &self.check_interval)
            .finish()
    }
}

fn modified(path: &Path) -> Option<SystemTime> {
    std::fs::metadata(path).and_then(|m| m.modified()).ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{Environment, ResolverConfig};
    use std::num::NonZeroUsize;

    fn write(path: &Path, content: &str) {
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, content).unwrap();
    }

    fn controller(class_name: &str, action: &str) -> String {
        format!(
            "class {} extends Controller {{\n fn {}(req: Any) -> Any {{}}\n}}\n",
            class_name, action
        )
    }

    fn artefacts_for(app: LoadedApplication) -> ControllerArtefacts {
        let config = ResolverConfig {
            environment: Environment::Production,
            cache_max_size: NonZeroUsize::new(32).unwrap(),
        };
        let plugins: Arc<dyn PluginManager> = Arc::new(app.plugins);
        ControllerArtefacts::new(app.registry, Some(plugins), config)
    }

    #[test]
    fn test_no_changes_no_reload() {
        let dir = tempfile::tempdir().unwrap();
        write(
            &dir.path().join("app/controllers/posts_controller.soli"),
            &controller("PostsController", "index"),
        );

        let app = load_application(dir.path()).unwrap();
        let mut watcher = ControllerWatcher::with_check_interval(dir.path(), Duration::ZERO);
        watcher.track_application(&app);
        assert_eq!(watcher.tracked_count(), 1);

        let artefacts = artefacts_for(app);
        assert_eq!(watcher.reload_if_changed(&artefacts).unwrap(), None);
        assert_eq!(artefacts.generation(), 1);
    }

    #[test]
    fn test_new_controller_file_triggers_reload() {
        let dir = tempfile::tempdir().unwrap();
        write(
            &dir.path().join("app/controllers/posts_controller.soli"),
            &controller("PostsController", "index"),
        );

        let app = load_application(dir.path()).unwrap();
        let mut watcher = ControllerWatcher::with_check_interval(dir.path(), Duration::ZERO);
        watcher.track_application(&app);
        let artefacts = artefacts_for(app);

        assert!(artefacts.resolve_uri("/users").is_none());

        write(
            &dir.path().join("app/controllers/users_controller.soli"),
            &controller("UsersController", "index"),
        );
        assert_eq!(watcher.reload_if_changed(&artefacts).unwrap(), Some(2));
        assert_eq!(
            artefacts.resolve_uri("/users").unwrap().class_name(),
            "UsersController"
        );
        assert_eq!(watcher.tracked_count(), 2);
    }

    #[test]
    fn test_deleted_controller_triggers_reload() {
        let dir = tempfile::tempdir().unwrap();
        let users = dir.path().join("app/controllers/users_controller.soli");
        write(&users, &controller("UsersController", "index"));

        let app = load_application(dir.path()).unwrap();
        let mut watcher = ControllerWatcher::with_check_interval(dir.path(), Duration::ZERO);
        watcher.track_application(&app);
        let artefacts = artefacts_for(app);
        assert!(artefacts.resolve_uri("/users").is_some());

        std::fs::remove_file(&users).unwrap();
        assert_eq!(watcher.reload_if_changed(&artefacts).unwrap(), Some(2));
        assert!(artefacts.resolve_uri("/users").is_none());
        assert_eq!(watcher.tracked_count(), 0);
    }

    #[test]
    fn test_modified_controller_is_detected() {
        let dir = tempfile::tempdir().unwrap();
        let posts = dir.path().join("app/controllers/posts_controller.soli");
        write(&posts, &controller("PostsController", "index"));

        let mut watcher = ControllerWatcher::with_check_interval(dir.path(), Duration::ZERO);
        watcher.track(&posts);
        assert!(watcher.get_changed_files().unwrap().is_empty());

        // Wait enough for filesystem mtime granularity (some filesystems have 1s resolution)
        std::thread::sleep(Duration::from_millis(1100));
        write(&posts, &controller("PostsController", "archive"));

        assert_eq!(watcher.get_changed_files().unwrap(), vec![posts.clone()]);
        assert!(watcher.get_changed_files().unwrap().is_empty());
    }

    #[test]
    fn test_checks_are_throttled() {
        let dir = tempfile::tempdir().unwrap();
        let mut watcher = ControllerWatcher::with_check_interval(dir.path(), Duration::from_secs(3600));
        assert!(watcher.get_changed_files().unwrap().is_empty());

        write(
            &dir.path().join("app/controllers/posts_controller.soli"),
            &controller("PostsController", "index"),
        );
        // Inside the interval: not looked at yet
        assert!(watcher.get_changed_files().unwrap().is_empty());
    }
}
