//! Compile Cache - identifier → compiled render function.
//!
//! Workflow on a miss:
//! 1. Resolve the identifier below the base directory
//! 2. Read and decode the template
//! 3. Compose it with its layout
//! 4. Compile through the compiler port
//! 5. Register one file watch, then store the function
//!
//! Watch events recompile (change) or evict (delete/rename). Readers see
//! either the old or the new `Arc`, never a partial update.

use std::{
    collections::HashMap,
    path::{Path, PathBuf},
    sync::{Arc, Mutex, RwLock, Weak},
};

use serde_json::Value;
use tracing::{debug, info, instrument, warn};

use crate::{
    application::{
        ApplicationError,
        ports::{
            CompileOptions, FileWatcher, Filesystem, IncludeResolver, RenderFunction,
            TemplateCompiler, WatchCallback, WatchEvent, WatchHandle,
        },
    },
    domain::{
        EngineOptions, LayoutCompositor, PathResolver, TagGrammar, TemplateId,
        include_identifier,
    },
    error::{StencilError, StencilResult},
};

/// Nesting limit for `include`; deeper chains are treated as cycles.
pub const MAX_INCLUDE_DEPTH: usize = 32;

/// Lazily populated, watch-invalidated cache of compiled templates.
///
/// Cheap to clone; clones share one cache.
#[derive(Clone)]
pub struct CompileCache {
    inner: Arc<CacheInner>,
}

struct CacheInner {
    options: EngineOptions,
    compositor: LayoutCompositor,
    filesystem: Arc<dyn Filesystem>,
    compiler: Arc<dyn TemplateCompiler>,
    watcher: Arc<dyn FileWatcher>,
    entries: RwLock<HashMap<TemplateId, RenderFunction>>,
    watches: Mutex<HashMap<TemplateId, Box<dyn WatchHandle>>>,
    // Handles evicted from a watch callback. Dropping one there would tear
    // down the watcher on its own event thread, so they wait for a caller.
    retired: Mutex<Vec<Box<dyn WatchHandle>>>,
    compile_locks: Mutex<HashMap<TemplateId, Arc<Mutex<()>>>>,
}

impl CompileCache {
    /// Build a cache from resolved options and the three driven ports.
    pub fn new(
        options: EngineOptions,
        filesystem: Arc<dyn Filesystem>,
        compiler: Arc<dyn TemplateCompiler>,
        watcher: Arc<dyn FileWatcher>,
    ) -> StencilResult<Self> {
        options.validate()?;
        let grammar = TagGrammar::new(options.delimiters.clone())?;
        let resolver = PathResolver::new(&options.base_dir, options.extension.clone());

        Ok(Self {
            inner: Arc::new(CacheInner {
                compositor: LayoutCompositor::new(grammar, resolver),
                options,
                filesystem,
                compiler,
                watcher,
                entries: RwLock::new(HashMap::new()),
                watches: Mutex::new(HashMap::new()),
                retired: Mutex::new(Vec::new()),
                compile_locks: Mutex::new(HashMap::new()),
            }),
        })
    }

    pub fn options(&self) -> &EngineOptions {
        &self.inner.options
    }

    pub fn compositor(&self) -> &LayoutCompositor {
        &self.inner.compositor
    }

    pub fn resolver(&self) -> &PathResolver {
        self.inner.compositor.resolver()
    }

    pub fn grammar(&self) -> &TagGrammar {
        self.inner.compositor.grammar()
    }

    /// Compiled function for `id`.
    ///
    /// `Ok(None)` when the template file cannot be read; nothing is cached
    /// and the next call tries again. Path escapes, unreadable layouts and
    /// compiler failures are errors.
    #[instrument(skip(self), fields(template = %id))]
    pub fn get(&self, id: &TemplateId) -> StencilResult<Option<RenderFunction>> {
        self.inner.release_retired()?;
        if let Some(function) = self.inner.cached(id)? {
            debug!("Cache hit");
            return Ok(Some(function));
        }

        let lock = self.inner.compile_lock(id)?;
        let _guard = lock.lock().map_err(|_| ApplicationError::CacheLockError)?;

        // Another caller may have compiled it while we waited.
        if let Some(function) = self.inner.cached(id)? {
            return Ok(Some(function));
        }

        debug!("Cache miss");
        let Some((path, function)) = self.inner.compile_from_fs(id)? else {
            return Ok(None);
        };

        self.watch(id, &path)?;
        self.inner.write_entries()?.insert(id.clone(), function.clone());
        info!(path = %path.display(), "Template compiled");

        Ok(Some(function))
    }

    /// Composed source for `id` without compiling or caching it.
    #[instrument(skip(self), fields(template = %id))]
    pub fn compose(&self, id: &TemplateId) -> StencilResult<Option<String>> {
        let path = self.resolver().resolve(id)?;
        let Some(source) = self.inner.read_template(&path)? else {
            return Ok(None);
        };
        self.inner.compose_source(id, &source).map(Some)
    }

    /// Raw (uncomposed) text of `id`.
    pub fn source(&self, id: &TemplateId) -> StencilResult<Option<String>> {
        let path = self.resolver().resolve(id)?;
        self.inner.read_template(&path)
    }

    /// Compile (or reuse) `id` and render it with `data`.
    #[instrument(skip(self, data), fields(template = %id))]
    pub fn render_file(&self, id: &TemplateId, data: &Value) -> StencilResult<String> {
        Includes::new(self).render(id, data)
    }

    /// Render `filename`, rewritten relative to `from`'s directory.
    pub fn include(
        &self,
        filename: &str,
        data: &Value,
        from: &TemplateId,
    ) -> StencilResult<String> {
        Includes::new(self).include(filename, data, from)
    }

    /// Drop the entry for `id` and release its watch.
    ///
    /// Returns whether an entry was present.
    pub fn invalidate(&self, id: &TemplateId) -> StencilResult<bool> {
        self.inner.release_retired()?;
        let (removed, handle) = self.inner.evict(id)?;
        drop(handle);
        Ok(removed)
    }

    pub fn contains(&self, id: &TemplateId) -> bool {
        self.inner
            .entries
            .read()
            .map(|entries| entries.contains_key(id))
            .unwrap_or(false)
    }

    pub fn len(&self) -> usize {
        self.inner.entries.read().map(|e| e.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of live file watches.
    pub fn watch_count(&self) -> usize {
        self.inner.watches.lock().map(|w| w.len()).unwrap_or(0)
    }

    /// Release every watch and clear every entry.
    ///
    /// The cache stays usable; later misses compile and watch again.
    pub fn close(&self) -> StencilResult<()> {
        let handles: Vec<Box<dyn WatchHandle>> = {
            let mut watches = self
                .inner
                .watches
                .lock()
                .map_err(|_| ApplicationError::CacheLockError)?;
            watches.drain().map(|(_, handle)| handle).collect()
        };
        self.inner.write_entries()?.clear();
        self.inner.release_retired()?;
        debug!(released = handles.len(), "Compile cache closed");
        drop(handles);
        Ok(())
    }

    fn watch(&self, id: &TemplateId, path: &Path) -> StencilResult<()> {
        let mut watches = self
            .inner
            .watches
            .lock()
            .map_err(|_| ApplicationError::CacheLockError)?;
        if watches.contains_key(id) {
            return Ok(());
        }

        let weak: Weak<CacheInner> = Arc::downgrade(&self.inner);
        let watched = id.clone();
        let callback: WatchCallback = Arc::new(move |event: WatchEvent| {
            if let Some(inner) = weak.upgrade() {
                inner.on_event(&watched, event);
            }
        });

        let handle = self.inner.watcher.watch(path, callback)?;
        debug!(path = %path.display(), "Watching template");
        watches.insert(id.clone(), handle);
        Ok(())
    }
}

impl CacheInner {
    fn cached(&self, id: &TemplateId) -> StencilResult<Option<RenderFunction>> {
        let entries = self
            .entries
            .read()
            .map_err(|_| ApplicationError::CacheLockError)?;
        Ok(entries.get(id).cloned())
    }

    fn write_entries(
        &self,
    ) -> StencilResult<std::sync::RwLockWriteGuard<'_, HashMap<TemplateId, RenderFunction>>> {
        self.entries
            .write()
            .map_err(|_| ApplicationError::CacheLockError.into())
    }

    fn compile_lock(&self, id: &TemplateId) -> StencilResult<Arc<Mutex<()>>> {
        let mut locks = self
            .compile_locks
            .lock()
            .map_err(|_| ApplicationError::CacheLockError)?;
        Ok(locks.entry(id.clone()).or_default().clone())
    }

    /// `None` when the template file itself is unreadable.
    fn compile_from_fs(
        &self,
        id: &TemplateId,
    ) -> StencilResult<Option<(PathBuf, RenderFunction)>> {
        let path = self.compositor.resolver().resolve(id)?;
        let Some(source) = self.read_template(&path)? else {
            return Ok(None);
        };

        let composed = self.compose_source(id, &source)?;
        let options = CompileOptions {
            template: id.clone(),
            delimiters: self.options.delimiters.clone(),
        };
        let function = self.compiler.compile(&composed, &options)?;
        Ok(Some((path, function)))
    }

    fn read_template(&self, path: &Path) -> StencilResult<Option<String>> {
        match self.filesystem.read(path) {
            Ok(bytes) => Ok(Some(self.options.encoding.decode(path, bytes)?)),
            Err(e) => {
                debug!(path = %path.display(), error = %e, "Template unreadable");
                Ok(None)
            }
        }
    }

    fn compose_source(&self, id: &TemplateId, source: &str) -> StencilResult<String> {
        self.compositor
            .compose(source, id, |layout_path| self.read_layout(layout_path))
    }

    fn read_layout(&self, path: &Path) -> StencilResult<String> {
        let bytes = self.filesystem.read(path).map_err(|e| {
            StencilError::from(ApplicationError::LayoutUnavailable {
                path: path.to_path_buf(),
                reason: e.to_string(),
            })
        })?;
        Ok(self.options.encoding.decode(path, bytes)?)
    }

    /// Remove the entry and hand back its watch so the caller decides
    /// where the handle is dropped. Never drop it while holding a lock.
    fn evict(&self, id: &TemplateId) -> StencilResult<(bool, Option<Box<dyn WatchHandle>>)> {
        let handle = self
            .watches
            .lock()
            .map_err(|_| ApplicationError::CacheLockError)?
            .remove(id);
        let removed = self
            .entries
            .write()
            .map_err(|_| ApplicationError::CacheLockError)?
            .remove(id)
            .is_some();
        Ok((removed, handle))
    }

    /// Evict from inside a watch callback, parking the handle.
    fn retire(&self, id: &TemplateId) -> StencilResult<()> {
        let (_, handle) = self.evict(id)?;
        if let Some(handle) = handle {
            self.retired
                .lock()
                .map_err(|_| ApplicationError::CacheLockError)?
                .push(handle);
        }
        Ok(())
    }

    fn release_retired(&self) -> StencilResult<()> {
        let handles: Vec<Box<dyn WatchHandle>> = std::mem::take(
            &mut *self
                .retired
                .lock()
                .map_err(|_| ApplicationError::CacheLockError)?,
        );
        if !handles.is_empty() {
            debug!(released = handles.len(), "Released retired watches");
        }
        Ok(())
    }

    fn on_event(&self, id: &TemplateId, event: WatchEvent) {
        debug!(template = %id, ?event, "Watch event");
        let result = match event {
            WatchEvent::Changed => self.recompile(id),
            WatchEvent::Removed | WatchEvent::Renamed => self.retire(id),
        };
        if let Err(e) = result {
            warn!(
                template = %id,
                error = %e,
                "Failed to refresh template; keeping previous version"
            );
        }
    }

    fn recompile(&self, id: &TemplateId) -> StencilResult<()> {
        let lock = self.compile_lock(id)?;
        let _guard = lock.lock().map_err(|_| ApplicationError::CacheLockError)?;

        match self.compile_from_fs(id)? {
            Some((_, function)) => {
                let watches = self
                    .watches
                    .lock()
                    .map_err(|_| ApplicationError::CacheLockError)?;
                // Closed or invalidated while compiling: do not resurrect it.
                if !watches.contains_key(id) {
                    return Ok(());
                }
                self.entries
                    .write()
                    .map_err(|_| ApplicationError::CacheLockError)?
                    .insert(id.clone(), function);
                info!(template = %id, "Template recompiled");
                Ok(())
            }
            None => {
                debug!(template = %id, "Changed template is unreadable; evicting");
                self.retire(id)
            }
        }
    }
}

/// Include resolution bound to one cache, tracking nesting depth.
struct Includes<'a> {
    cache: &'a CompileCache,
    depth: usize,
}

impl<'a> Includes<'a> {
    fn new(cache: &'a CompileCache) -> Self {
        Self { cache, depth: 0 }
    }

    fn render(&self, id: &TemplateId, data: &Value) -> StencilResult<String> {
        let function = self
            .cache
            .get(id)?
            .ok_or_else(|| ApplicationError::TemplateNotFound { id: id.to_string() })?;
        function.render(data, self)
    }
}

impl IncludeResolver for Includes<'_> {
    fn include(&self, filename: &str, data: &Value, from: &TemplateId) -> StencilResult<String> {
        let target = include_identifier(from, filename)?;
        if self.depth >= MAX_INCLUDE_DEPTH {
            return Err(ApplicationError::IncludeDepthExceeded {
                template: target.to_string(),
                depth: self.depth,
            }
            .into());
        }
        debug!(from = %from, include = %target, "Including template");
        Includes {
            cache: self.cache,
            depth: self.depth + 1,
        }
        .render(&target, data)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

    use serde_json::json;

    use super::*;
    use crate::application::ports::{
        MockFileWatcher, MockFilesystem, MockTemplateCompiler, Render,
    };

    // ── fakes ─────────────────────────────────────────────────────────────

    /// Render function that returns the composed source verbatim, or the
    /// concatenation of its includes when the source is `include:a,b`.
    struct Echo {
        id: TemplateId,
        source: String,
    }

    impl Render for Echo {
        fn render(&self, data: &Value, includes: &dyn IncludeResolver) -> StencilResult<String> {
            match self.source.strip_prefix("include:") {
                Some(list) => list
                    .split(',')
                    .map(|name| includes.include(name, data, &self.id))
                    .collect(),
                None => Ok(self.source.clone()),
            }
        }
    }

    /// Compiler producing [`Echo`] functions and counting compilations.
    #[derive(Default)]
    struct EchoCompiler {
        compiled: AtomicUsize,
    }

    impl TemplateCompiler for EchoCompiler {
        fn compile(&self, source: &str, options: &CompileOptions) -> StencilResult<RenderFunction> {
            self.compiled.fetch_add(1, Ordering::SeqCst);
            Ok(Arc::new(Echo {
                id: options.template.clone(),
                source: source.to_string(),
            }))
        }
    }

    /// Shared, mutable file map behind a mocked filesystem.
    #[derive(Clone, Default)]
    struct Files {
        map: Arc<Mutex<HashMap<PathBuf, String>>>,
        reads: Arc<AtomicUsize>,
    }

    impl Files {
        fn put(&self, path: &str, content: &str) {
            self.map
                .lock()
                .unwrap()
                .insert(PathBuf::from(path), content.to_string());
        }

        fn remove(&self, path: &str) {
            self.map.lock().unwrap().remove(Path::new(path));
        }

        fn reads(&self) -> usize {
            self.reads.load(Ordering::SeqCst)
        }

        fn mock(&self) -> MockFilesystem {
            let files = self.clone();
            let mut fs = MockFilesystem::new();
            fs.expect_read().returning(move |path| {
                files.reads.fetch_add(1, Ordering::SeqCst);
                files
                    .map
                    .lock()
                    .unwrap()
                    .get(path)
                    .map(|s| s.clone().into_bytes())
                    .ok_or_else(|| {
                        ApplicationError::FilesystemError {
                            path: path.to_path_buf(),
                            reason: "No such file".into(),
                        }
                        .into()
                    })
            });
            fs
        }
    }

    struct Handle(PathBuf);

    impl WatchHandle for Handle {
        fn path(&self) -> &Path {
            &self.0
        }
    }

    /// Handle that records when it is released.
    struct TrackedHandle {
        path: PathBuf,
        dropped: Arc<AtomicBool>,
    }

    impl WatchHandle for TrackedHandle {
        fn path(&self) -> &Path {
            &self.path
        }
    }

    impl Drop for TrackedHandle {
        fn drop(&mut self) {
            self.dropped.store(true, Ordering::SeqCst);
        }
    }

    fn tracking_watcher(
        callbacks: Arc<Mutex<Vec<(PathBuf, WatchCallback)>>>,
        dropped: Arc<AtomicBool>,
    ) -> MockFileWatcher {
        let mut watcher = MockFileWatcher::new();
        watcher.expect_watch().returning(move |path, cb| {
            callbacks.lock().unwrap().push((path.to_path_buf(), cb));
            Ok(Box::new(TrackedHandle {
                path: path.to_path_buf(),
                dropped: dropped.clone(),
            }) as Box<dyn WatchHandle>)
        });
        watcher
    }

    /// Watcher mock that records every callback it is given.
    fn recording_watcher(
        callbacks: Arc<Mutex<Vec<(PathBuf, WatchCallback)>>>,
        times: usize,
    ) -> MockFileWatcher {
        let mut watcher = MockFileWatcher::new();
        watcher.expect_watch().times(times).returning(move |path, cb| {
            callbacks.lock().unwrap().push((path.to_path_buf(), cb));
            Ok(Box::new(Handle(path.to_path_buf())) as Box<dyn WatchHandle>)
        });
        watcher
    }

    fn id(s: &str) -> TemplateId {
        TemplateId::new(s).unwrap()
    }

    fn cache_with(files: &Files, watcher: MockFileWatcher) -> (CompileCache, Arc<EchoCompiler>) {
        let compiler = Arc::new(EchoCompiler::default());
        let cache = CompileCache::new(
            EngineOptions::new("/tpl"),
            Arc::new(files.mock()),
            compiler.clone(),
            Arc::new(watcher),
        )
        .unwrap();
        (cache, compiler)
    }

    fn render(cache: &CompileCache, name: &str) -> String {
        let function = cache.get(&id(name)).unwrap().expect("template compiled");
        function.render(&json!({}), &Includes::new(cache)).unwrap()
    }

    // ── tests ─────────────────────────────────────────────────────────────

    #[test]
    fn unrequested_identifiers_never_touch_the_filesystem() {
        let mut fs = MockFilesystem::new();
        fs.expect_read().never();
        let mut watcher = MockFileWatcher::new();
        watcher.expect_watch().never();

        let cache = CompileCache::new(
            EngineOptions::new("/tpl"),
            Arc::new(fs),
            Arc::new(EchoCompiler::default()),
            Arc::new(watcher),
        )
        .unwrap();
        assert!(cache.is_empty());
        assert!(!cache.contains(&id("page")));
    }

    #[test]
    fn hit_does_not_read_again() {
        let files = Files::default();
        files.put("/tpl/page.html", "<p>hi</p>");
        let callbacks = Arc::new(Mutex::new(Vec::new()));
        let (cache, compiler) = cache_with(&files, recording_watcher(callbacks.clone(), 1));

        assert_eq!(render(&cache, "page"), "<p>hi</p>");
        let reads = files.reads();
        assert_eq!(render(&cache, "page"), "<p>hi</p>");
        assert_eq!(files.reads(), reads);
        assert_eq!(compiler.compiled.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn watch_is_registered_on_extension_qualified_path() {
        let files = Files::default();
        files.put("/tpl/blog/post.html", "post");
        let callbacks = Arc::new(Mutex::new(Vec::new()));
        let (cache, _) = cache_with(&files, recording_watcher(callbacks.clone(), 1));

        cache.get(&id("blog/post")).unwrap();
        let watched = callbacks.lock().unwrap()[0].0.clone();
        assert_eq!(watched, PathBuf::from("/tpl/blog/post.html"));
        assert_eq!(cache.watch_count(), 1);
    }

    #[test]
    fn missing_template_is_none_and_not_cached() {
        let files = Files::default();
        let (cache, compiler) = cache_with(&files, recording_watcher(Default::default(), 0));

        assert!(cache.get(&id("ghost")).unwrap().is_none());
        assert!(cache.get(&id("ghost")).unwrap().is_none());
        // No negative caching: every call retries the read.
        assert_eq!(files.reads(), 2);
        assert!(cache.is_empty());
        assert_eq!(cache.watch_count(), 0);
        assert_eq!(compiler.compiled.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn template_appearing_later_is_picked_up() {
        let files = Files::default();
        let (cache, _) = cache_with(&files, recording_watcher(Default::default(), 1));

        assert!(cache.get(&id("late")).unwrap().is_none());
        files.put("/tpl/late.html", "now here");
        assert_eq!(render(&cache, "late"), "now here");
    }

    #[test]
    fn path_escape_is_an_error() {
        let mut fs = MockFilesystem::new();
        fs.expect_read().never();
        let cache = CompileCache::new(
            EngineOptions::new("/tpl"),
            Arc::new(fs),
            Arc::new(EchoCompiler::default()),
            Arc::new(recording_watcher(Default::default(), 0)),
        )
        .unwrap();
        let err = cache.get(&id("../../etc/passwd")).unwrap_err();
        assert!(err.is_path_escape());
    }

    #[test]
    fn missing_layout_is_an_error_and_not_cached() {
        let files = Files::default();
        files.put("/tpl/page.html", "{{layout 'base'}}x");
        let (cache, _) = cache_with(&files, recording_watcher(Default::default(), 0));

        let err = cache.get(&id("page")).unwrap_err();
        assert!(matches!(
            err,
            StencilError::Application(ApplicationError::LayoutUnavailable { .. })
        ));
        assert!(cache.is_empty());
    }

    #[test]
    fn composes_before_compiling() {
        let files = Files::default();
        files.put("/tpl/base.html", "<body>{{renderBody}}</body>");
        files.put("/tpl/page.html", "{{layout 'base'}}<h1>Hi</h1>");
        let (cache, _) = cache_with(&files, recording_watcher(Default::default(), 1));

        assert_eq!(render(&cache, "page"), "<body><h1>Hi</h1></body>");
        assert_eq!(
            cache.compose(&id("page")).unwrap().as_deref(),
            Some("<body><h1>Hi</h1></body>")
        );
    }

    #[test]
    fn change_event_recompiles_without_new_watch() {
        let files = Files::default();
        files.put("/tpl/page.html", "v1");
        let callbacks = Arc::new(Mutex::new(Vec::new()));
        // `times(1)`: a second watch registration fails the test.
        let (cache, compiler) = cache_with(&files, recording_watcher(callbacks.clone(), 1));

        assert_eq!(render(&cache, "page"), "v1");

        files.put("/tpl/page.html", "v2");
        let callback = callbacks.lock().unwrap()[0].1.clone();
        callback(WatchEvent::Changed);

        assert_eq!(render(&cache, "page"), "v2");
        assert_eq!(compiler.compiled.load(Ordering::SeqCst), 2);
        assert_eq!(cache.watch_count(), 1);
    }

    #[test]
    fn failed_recompile_keeps_previous_function() {
        let files = Files::default();
        files.put("/tpl/page.html", "good");
        let callbacks = Arc::new(Mutex::new(Vec::new()));
        let (cache, _) = cache_with(&files, recording_watcher(callbacks.clone(), 1));
        render(&cache, "page");

        files.put("/tpl/page.html", "{{layout 'missing'}}bad");
        let callback = callbacks.lock().unwrap()[0].1.clone();
        callback(WatchEvent::Changed);

        assert_eq!(render(&cache, "page"), "good");
    }

    #[test]
    fn remove_event_evicts_entry_and_watch() {
        let files = Files::default();
        files.put("/tpl/page.html", "v1");
        let callbacks = Arc::new(Mutex::new(Vec::new()));
        let (cache, _) = cache_with(&files, recording_watcher(callbacks.clone(), 1));
        render(&cache, "page");

        files.remove("/tpl/page.html");
        let callback = callbacks.lock().unwrap()[0].1.clone();
        callback(WatchEvent::Removed);

        assert!(!cache.contains(&id("page")));
        assert_eq!(cache.watch_count(), 0);
        assert!(cache.get(&id("page")).unwrap().is_none());
    }

    #[test]
    fn rename_event_then_recreate_watches_again() {
        let files = Files::default();
        files.put("/tpl/page.html", "v1");
        let callbacks = Arc::new(Mutex::new(Vec::new()));
        let (cache, _) = cache_with(&files, recording_watcher(callbacks.clone(), 2));
        render(&cache, "page");

        let callback = callbacks.lock().unwrap()[0].1.clone();
        callback(WatchEvent::Renamed);
        files.put("/tpl/page.html", "v3");

        assert_eq!(render(&cache, "page"), "v3");
        assert_eq!(cache.watch_count(), 1);
    }

    #[test]
    fn handle_evicted_by_event_is_released_outside_the_callback() {
        let files = Files::default();
        files.put("/tpl/page.html", "v1");
        let callbacks = Arc::new(Mutex::new(Vec::new()));
        let dropped = Arc::new(AtomicBool::new(false));
        let (cache, _) = cache_with(&files, tracking_watcher(callbacks.clone(), dropped.clone()));
        render(&cache, "page");

        files.remove("/tpl/page.html");
        let callback = callbacks.lock().unwrap()[0].1.clone();
        callback(WatchEvent::Removed);

        // Still alive on the event thread; the entry is already gone.
        assert!(!dropped.load(Ordering::SeqCst));
        assert_eq!(cache.watch_count(), 0);
        assert!(!cache.contains(&id("page")));

        assert!(cache.get(&id("page")).unwrap().is_none());
        assert!(dropped.load(Ordering::SeqCst));
    }

    #[test]
    fn close_releases_handles_retired_by_events() {
        let files = Files::default();
        files.put("/tpl/page.html", "v1");
        let callbacks = Arc::new(Mutex::new(Vec::new()));
        let dropped = Arc::new(AtomicBool::new(false));
        let (cache, _) = cache_with(&files, tracking_watcher(callbacks.clone(), dropped.clone()));
        render(&cache, "page");

        let callback = callbacks.lock().unwrap()[0].1.clone();
        callback(WatchEvent::Renamed);
        assert!(!dropped.load(Ordering::SeqCst));

        cache.close().unwrap();
        assert!(dropped.load(Ordering::SeqCst));
    }

    #[test]
    fn invalidate_releases_handle_immediately() {
        let files = Files::default();
        files.put("/tpl/page.html", "v1");
        let dropped = Arc::new(AtomicBool::new(false));
        let (cache, _) = cache_with(&files, tracking_watcher(Default::default(), dropped.clone()));
        render(&cache, "page");

        assert!(cache.invalidate(&id("page")).unwrap());
        assert!(dropped.load(Ordering::SeqCst));
    }

    #[test]
    fn change_to_unreadable_file_evicts() {
        let files = Files::default();
        files.put("/tpl/page.html", "v1");
        let callbacks = Arc::new(Mutex::new(Vec::new()));
        let (cache, _) = cache_with(&files, recording_watcher(callbacks.clone(), 1));
        render(&cache, "page");

        files.remove("/tpl/page.html");
        let callback = callbacks.lock().unwrap()[0].1.clone();
        callback(WatchEvent::Changed);
        assert!(cache.is_empty());
    }

    #[test]
    fn close_releases_watches_and_ignores_late_events() {
        let files = Files::default();
        files.put("/tpl/page.html", "v1");
        let callbacks = Arc::new(Mutex::new(Vec::new()));
        let (cache, _) = cache_with(&files, recording_watcher(callbacks.clone(), 1));
        render(&cache, "page");

        cache.close().unwrap();
        assert_eq!(cache.watch_count(), 0);
        assert!(cache.is_empty());

        // An event already in flight must not resurrect the entry.
        let callback = callbacks.lock().unwrap()[0].1.clone();
        callback(WatchEvent::Changed);
        assert!(cache.is_empty());
    }

    #[test]
    fn callbacks_do_not_keep_the_cache_alive() {
        let files = Files::default();
        files.put("/tpl/page.html", "v1");
        let callbacks = Arc::new(Mutex::new(Vec::new()));
        let (cache, _) = cache_with(&files, recording_watcher(callbacks.clone(), 1));
        render(&cache, "page");
        drop(cache);

        let callback = callbacks.lock().unwrap()[0].1.clone();
        // Upgrading the weak reference fails; the event is a no-op.
        callback(WatchEvent::Changed);
    }

    #[test]
    fn invalidate_forces_recompile() {
        let files = Files::default();
        files.put("/tpl/page.html", "v1");
        let (cache, compiler) = cache_with(&files, recording_watcher(Default::default(), 2));
        render(&cache, "page");

        assert!(cache.invalidate(&id("page")).unwrap());
        assert!(!cache.invalidate(&id("page")).unwrap());
        render(&cache, "page");
        assert_eq!(compiler.compiled.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn watch_failure_propagates_and_caches_nothing() {
        let files = Files::default();
        files.put("/tpl/page.html", "v1");
        let mut watcher = MockFileWatcher::new();
        watcher.expect_watch().returning(|path, _| {
            Err(ApplicationError::WatchFailed {
                path: path.to_path_buf(),
                reason: "limit reached".into(),
            }
            .into())
        });
        let (cache, _) = cache_with(&files, watcher);

        assert!(cache.get(&id("page")).is_err());
        assert!(cache.is_empty());
    }

    #[test]
    fn compiler_errors_propagate() {
        let files = Files::default();
        files.put("/tpl/page.html", "v1");
        let mut compiler = MockTemplateCompiler::new();
        compiler.expect_compile().returning(|_, options| {
            Err(ApplicationError::CompileFailed {
                template: options.template.to_string(),
                reason: "unexpected token".into(),
            }
            .into())
        });
        let cache = CompileCache::new(
            EngineOptions::new("/tpl"),
            Arc::new(files.mock()),
            Arc::new(compiler),
            Arc::new(recording_watcher(Default::default(), 0)),
        )
        .unwrap();

        let err = cache.get(&id("page")).unwrap_err();
        assert!(err.to_string().contains("unexpected token"));
    }

    #[test]
    fn render_file_follows_includes_relative_to_caller() {
        let files = Files::default();
        files.put("/tpl/blog/post.html", "include:parts/head,../footer");
        files.put("/tpl/blog/parts/head.html", "<head>");
        files.put("/tpl/footer.html", "<footer>");
        let (cache, _) = cache_with(&files, recording_watcher(Default::default(), 3));

        let out = cache.render_file(&id("blog/post"), &json!({})).unwrap();
        assert_eq!(out, "<head><footer>");
    }

    #[test]
    fn include_cycle_is_cut_off() {
        let files = Files::default();
        files.put("/tpl/a.html", "include:b");
        files.put("/tpl/b.html", "include:a");
        let (cache, _) = cache_with(&files, recording_watcher(Default::default(), 2));

        let err = cache.render_file(&id("a"), &json!({})).unwrap_err();
        assert!(matches!(
            err,
            StencilError::Application(ApplicationError::IncludeDepthExceeded { .. })
        ));
    }

    #[test]
    fn render_file_of_missing_template_is_not_found() {
        let files = Files::default();
        let (cache, _) = cache_with(&files, recording_watcher(Default::default(), 0));
        let err = cache.render_file(&id("nope"), &json!({})).unwrap_err();
        assert!(matches!(
            err,
            StencilError::Application(ApplicationError::TemplateNotFound { .. })
        ));
    }

    #[test]
    fn concurrent_first_gets_compile_once() {
        let files = Files::default();
        files.put("/tpl/page.html", "shared");
        let (cache, compiler) = cache_with(&files, recording_watcher(Default::default(), 1));

        std::thread::scope(|scope| {
            for _ in 0..8 {
                let cache = cache.clone();
                scope.spawn(move || {
                    assert!(cache.get(&id("page")).unwrap().is_some());
                });
            }
        });
        assert_eq!(compiler.compiled.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn invalid_options_are_rejected() {
        let files = Files::default();
        let result = CompileCache::new(
            EngineOptions::new("/tpl").with_extension("html"),
            Arc::new(files.mock()),
            Arc::new(EchoCompiler::default()),
            Arc::new(recording_watcher(Default::default(), 0)),
        );
        assert!(result.is_err());
    }
}
