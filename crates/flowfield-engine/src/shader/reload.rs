use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::rc::Rc;
use std::sync::mpsc::{self, Receiver, Sender};

use notify::{EventKind, RecommendedWatcher, RecursiveMode, Watcher};

use super::FrameTaskQueue;

struct WatchEntry {
    paths: Vec<PathBuf>,
    rebuild: Rc<dyn Fn()>,
}

/// Watches shader source files and schedules rebuilds on the render thread.
///
/// The `notify` watcher runs on its own thread and only forwards changed paths
/// over a channel. [`ShaderReloader::poll`] is called once per frame; it turns
/// those paths into rebuild tasks on a [`FrameTaskQueue`], so the rebuild itself
/// always happens on the thread that owns the device.
pub struct ShaderReloader {
    entries: Vec<WatchEntry>,
    tx: Sender<PathBuf>,
    rx: Receiver<PathBuf>,
    watcher: Option<RecommendedWatcher>,
    watched_dirs: HashSet<PathBuf>,
}

impl ShaderReloader {
    /// Creates a reloader backed by the platform file watcher.
    ///
    /// If the watcher cannot be created, live reload is disabled with a warning;
    /// [`ShaderReloader::mark_changed`] keeps working.
    pub fn new() -> Self {
        let mut reloader = Self::manual();
        let tx = reloader.tx.clone();
        let watcher = notify::recommended_watcher(move |res: notify::Result<notify::Event>| {
            match res {
                Ok(event) => {
                    if matches!(event.kind, EventKind::Modify(_) | EventKind::Create(_)) {
                        for path in event.paths {
                            if let Err(e) = tx.send(path) {
                                log::trace!("reloader gone, dropping change: {}", e.0.display());
                            }
                        }
                    }
                }
                Err(e) => log::warn!("file watcher error: {e}"),
            }
        });
        match watcher {
            Ok(w) => reloader.watcher = Some(w),
            Err(e) => log::warn!("shader hot reload disabled: {e}"),
        }
        reloader
    }

    /// A reloader with no file watcher; changes arrive only via `mark_changed`.
    pub fn manual() -> Self {
        let (tx, rx) = mpsc::channel();
        Self {
            entries: Vec::new(),
            tx,
            rx,
            watcher: None,
            watched_dirs: HashSet::new(),
        }
    }

    pub fn is_watching(&self) -> bool {
        self.watcher.is_some()
    }

    /// Registers `rebuild` to run whenever any of `paths` changes.
    pub fn add_files_to_watch<I, P>(&mut self, paths: I, rebuild: impl Fn() + 'static)
    where
        I: IntoIterator<Item = P>,
        P: AsRef<Path>,
    {
        let paths: Vec<PathBuf> = paths
            .into_iter()
            .map(|p| normalize(p.as_ref()))
            .collect();

        for path in &paths {
            let Some(dir) = path.parent() else { continue };
            if !self.watched_dirs.insert(dir.to_path_buf()) {
                continue;
            }
            // Editors often save by rename, so the directory is watched rather than the file.
            if let Some(watcher) = self.watcher.as_mut() {
                if let Err(e) = watcher.watch(dir, RecursiveMode::NonRecursive) {
                    log::warn!("cannot watch {}: {e}", dir.display());
                }
            }
        }

        log::debug!("watching {} shader file(s)", paths.len());
        self.entries.push(WatchEntry {
            paths,
            rebuild: Rc::new(rebuild),
        });
    }

    /// Reports a change detected outside the watcher.
    pub fn mark_changed(&self, path: impl AsRef<Path>) {
        if let Err(e) = self.tx.send(path.as_ref().to_path_buf()) {
            log::trace!("change to {} not delivered", e.0.display());
        }
    }

    /// Moves pending changes onto `tasks`. Each entry is queued at most once per call.
    ///
    /// Returns the number of rebuilds queued.
    pub fn poll(&mut self, tasks: &mut FrameTaskQueue) -> usize {
        let changed: HashSet<PathBuf> = self.rx.try_iter().map(|p| normalize(&p)).collect();
        if changed.is_empty() {
            return 0;
        }

        let mut queued = 0;
        for entry in &self.entries {
            if let Some(path) = entry.paths.iter().find(|p| changed.contains(*p)) {
                log::info!("{} changed, rebuilding before next frame", path.display());
                let rebuild = Rc::clone(&entry.rebuild);
                tasks.queue_before_render(move || rebuild());
                queued += 1;
            }
        }
        queued
    }
}

impl Default for ShaderReloader {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for ShaderReloader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ShaderReloader")
            .field("entries", &self.entries.len())
            .field("watching", &self.watcher.is_some())
            .field("watched_dirs", &self.watched_dirs)
            .finish()
    }
}

fn normalize(path: &Path) -> PathBuf {
    std::fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf())
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;
    use std::fs;

    use super::*;

    fn counter() -> (Rc<Cell<u32>>, impl Fn() + 'static) {
        let count = Rc::new(Cell::new(0));
        let c = Rc::clone(&count);
        (count, move || c.set(c.get() + 1))
    }

    #[test]
    fn change_queues_rebuild_without_running_it() {
        let dir = tempfile::tempdir().unwrap();
        let vert = dir.path().join("a.vert.wgsl");
        fs::write(&vert, "").unwrap();

        let mut reloader = ShaderReloader::manual();
        let (count, rebuild) = counter();
        reloader.add_files_to_watch([&vert], rebuild);

        reloader.mark_changed(&vert);
        let mut tasks = FrameTaskQueue::new();
        assert_eq!(reloader.poll(&mut tasks), 1);
        assert_eq!(count.get(), 0);

        tasks.drain();
        assert_eq!(count.get(), 1);
    }

    #[test]
    fn several_changes_to_one_program_rebuild_once() {
        let dir = tempfile::tempdir().unwrap();
        let vert = dir.path().join("b.vert.wgsl");
        let frag = dir.path().join("b.frag.wgsl");
        fs::write(&vert, "").unwrap();
        fs::write(&frag, "").unwrap();

        let mut reloader = ShaderReloader::manual();
        let (count, rebuild) = counter();
        reloader.add_files_to_watch([&vert, &frag], rebuild);

        reloader.mark_changed(&vert);
        reloader.mark_changed(&frag);
        reloader.mark_changed(&vert);

        let mut tasks = FrameTaskQueue::new();
        assert_eq!(reloader.poll(&mut tasks), 1);
        tasks.drain();
        assert_eq!(count.get(), 1);
    }

    #[test]
    fn only_matching_entries_are_queued() {
        let dir = tempfile::tempdir().unwrap();
        let field = dir.path().join("field.wgsl");
        let particles = dir.path().join("particles.wgsl");
        let other = dir.path().join("notes.txt");
        for p in [&field, &particles, &other] {
            fs::write(p, "").unwrap();
        }

        let mut reloader = ShaderReloader::manual();
        let (field_count, field_rebuild) = counter();
        let (particle_count, particle_rebuild) = counter();
        reloader.add_files_to_watch([&field], field_rebuild);
        reloader.add_files_to_watch([&particles], particle_rebuild);

        reloader.mark_changed(&other);
        let mut tasks = FrameTaskQueue::new();
        assert_eq!(reloader.poll(&mut tasks), 0);

        reloader.mark_changed(&particles);
        assert_eq!(reloader.poll(&mut tasks), 1);
        tasks.drain();
        assert_eq!(field_count.get(), 0);
        assert_eq!(particle_count.get(), 1);
    }

    #[test]
    fn poll_without_changes_is_a_no_op() {
        let mut reloader = ShaderReloader::manual();
        let mut tasks = FrameTaskQueue::new();
        assert_eq!(reloader.poll(&mut tasks), 0);
        assert!(tasks.is_empty());
    }
}
