//! Generic parameters functions
//!
//! Parameter files are TOML documents deserialised into typed structures. A loaded structure is
//! never modified, instead a reload produces a new snapshot which is installed into a
//! [`ParamStore`], after which every registered observer is told about the new values.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use log::{info, warn};
use serde::de::DeserializeOwned;
use std::fs::read_to_string;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, RwLock};
use thiserror::Error;
use toml;

// ---------------------------------------------------------------------------
// TRAITS
// ---------------------------------------------------------------------------

/// Parameters which can check their own consistency after being deserialised.
pub trait Validate {
    /// The reason a parameter set is rejected.
    type Error: std::fmt::Display;

    /// Determines if the parameters are valid.
    fn are_valid(&self) -> Result<(), Self::Error>;
}

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Observer called with the newly installed parameters.
pub type Observer<P> = Box<dyn Fn(&P) + Send + Sync>;

/// Thread safe holder of the current parameter snapshot.
///
/// Readers take a cheap `Arc` clone of the snapshot with [`ParamStore::current`], so a value read
/// during one computation cannot change underneath it. Installing a new snapshot notifies the
/// observers synchronously on the installing thread, in registration order.
pub struct ParamStore<P> {
    current: RwLock<Arc<P>>,

    /// Held for the whole of an install so observers see snapshots in the order they were
    /// installed.
    observers: Mutex<Vec<Observer<P>>>,
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// An error that occurs during loading of a parameter file.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("The software root environment variable (TRAIL_SW_ROOT) is not set")]
    SwRootNotSet,

    #[error("Cannot load the parmeter file {0:?}: {1}")]
    FileLoadError(PathBuf, std::io::Error),

    #[error("Cannot read the parameter file: {0}")]
    DeserialiseError(toml::de::Error),

    #[error("The loaded parameters are invalid: {0}")]
    Invalid(String),
}

// ---------------------------------------------------------------------------
// PUBLIC FUNCTIONS
// ---------------------------------------------------------------------------

/// Get the absolute path of a parameter file.
///
/// The file path is relative to the "params" directory in the software root.
pub fn param_file_path(param_file_path: &str) -> Result<PathBuf, LoadError> {
    let mut path = crate::host::get_sw_root().map_err(|_| LoadError::SwRootNotSet)?;
    path.push("params");
    path.push(param_file_path);
    Ok(path)
}

/// Load a parameter file
///
/// The file path is relative to the "params" directory in the software root.
pub fn load<P>(param_file_path: &str) -> Result<P, LoadError>
where
    P: DeserializeOwned,
{
    load_path(self::param_file_path(param_file_path)?)
}

/// Load a parameter file from an absolute path.
pub fn load_path<P, Q>(path: Q) -> Result<P, LoadError>
where
    P: DeserializeOwned,
    Q: AsRef<Path>,
{
    // Load the file into a string
    let params_str = read_to_string(path.as_ref())
        .map_err(|e| LoadError::FileLoadError(path.as_ref().to_path_buf(), e))?;

    // Parse the string into the parameter struct
    toml::from_str(params_str.as_str()).map_err(LoadError::DeserialiseError)
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl<P> ParamStore<P> {
    /// Create a new store holding the given initial parameters.
    pub fn new(initial: P) -> Self {
        Self {
            current: RwLock::new(Arc::new(initial)),
            observers: Mutex::new(Vec::new()),
        }
    }

    /// Get the current snapshot.
    pub fn current(&self) -> Arc<P> {
        match self.current.read() {
            Ok(c) => c.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    /// Register an observer to be called after every install.
    pub fn add_observer<F>(&self, observer: F)
    where
        F: Fn(&P) + Send + Sync + 'static,
    {
        self.lock_observers().push(Box::new(observer));
    }

    /// Replace the current snapshot and notify all observers.
    pub fn install(&self, params: P) {
        let observers = self.lock_observers();
        let params = Arc::new(params);

        match self.current.write() {
            Ok(mut c) => *c = params.clone(),
            Err(poisoned) => *poisoned.into_inner() = params.clone(),
        }

        for observer in observers.iter() {
            observer(&params);
        }
    }

    fn lock_observers(&self) -> std::sync::MutexGuard<'_, Vec<Observer<P>>> {
        self.observers
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl<P> ParamStore<P>
where
    P: DeserializeOwned + Validate,
{
    /// Reload the parameters from the given absolute path.
    ///
    /// If the file cannot be loaded or the loaded parameters are not valid the current snapshot is
    /// kept and the error is returned.
    pub fn reload_path<Q: AsRef<Path>>(&self, path: Q) -> Result<(), LoadError> {
        let result = load_path::<P, _>(path.as_ref()).and_then(|p| {
            p.are_valid()
                .map_err(|e| LoadError::Invalid(e.to_string()))
                .map(|_| p)
        });

        match result {
            Ok(p) => {
                self.install(p);
                info!("Parameters reloaded from {:?}", path.as_ref());
                Ok(())
            }
            Err(e) => {
                warn!("Parameter reload failed, keeping previous values: {}", e);
                Err(e)
            }
        }
    }

    /// Reload the parameters from a path relative to the "params" directory.
    pub fn reload(&self, param_file_path: &str) -> Result<(), LoadError> {
        self.reload_path(self::param_file_path(param_file_path)?)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use serde::Deserialize;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Debug, Deserialize, PartialEq)]
    struct TestParams {
        gain: f64,
        window: usize,
    }

    impl Validate for TestParams {
        type Error = String;

        fn are_valid(&self) -> Result<(), String> {
            match self.window {
                0 => Err(String::from("window must not be empty")),
                _ => Ok(()),
            }
        }
    }

    fn write_temp(name: &str, contents: &str) -> PathBuf {
        let path = std::env::temp_dir().join(format!(
            "trail_util_params_{}_{}.toml",
            std::process::id(),
            name
        ));
        std::fs::write(&path, contents).unwrap();
        path
    }

    #[test]
    fn test_install_notifies_observers_in_order() {
        let store = ParamStore::new(TestParams { gain: 1.0, window: 3 });
        let calls = Arc::new(Mutex::new(Vec::new()));

        let c0 = calls.clone();
        store.add_observer(move |p: &TestParams| c0.lock().unwrap().push((0, p.gain)));
        let c1 = calls.clone();
        store.add_observer(move |p: &TestParams| c1.lock().unwrap().push((1, p.gain)));

        store.install(TestParams { gain: 2.0, window: 3 });

        assert_eq!(store.current().gain, 2.0);
        assert_eq!(*calls.lock().unwrap(), vec![(0, 2.0), (1, 2.0)]);
    }

    #[test]
    fn test_snapshot_is_immutable_after_install() {
        let store = ParamStore::new(TestParams { gain: 1.0, window: 3 });
        let before = store.current();

        store.install(TestParams { gain: 5.0, window: 4 });

        assert_eq!(before.gain, 1.0);
        assert_eq!(store.current().window, 4);
    }

    #[test]
    fn test_reload_path() {
        let path = write_temp("good", "gain = 0.5\nwindow = 8\n");
        let store = ParamStore::new(TestParams { gain: 1.0, window: 3 });

        let count = Arc::new(AtomicUsize::new(0));
        let c = count.clone();
        store.add_observer(move |_: &TestParams| {
            c.fetch_add(1, Ordering::SeqCst);
        });

        store.reload_path(&path).unwrap();

        assert_eq!(*store.current(), TestParams { gain: 0.5, window: 8 });
        assert_eq!(count.load(Ordering::SeqCst), 1);

        std::fs::remove_file(path).ok();
    }

    #[test]
    fn test_failed_reload_keeps_previous_values() {
        let store = ParamStore::new(TestParams { gain: 1.0, window: 3 });
        let count = Arc::new(AtomicUsize::new(0));
        let c = count.clone();
        store.add_observer(move |_: &TestParams| {
            c.fetch_add(1, Ordering::SeqCst);
        });

        // Missing file
        let missing = std::env::temp_dir().join("trail_util_params_does_not_exist.toml");
        assert!(matches!(
            store.reload_path(&missing),
            Err(LoadError::FileLoadError(_, _))
        ));

        // Malformed file
        let malformed = write_temp("malformed", "gain = \n");
        assert!(matches!(
            store.reload_path(&malformed),
            Err(LoadError::DeserialiseError(_))
        ));

        // Well formed but invalid
        let invalid = write_temp("invalid", "gain = 3.0\nwindow = 0\n");
        assert!(matches!(
            store.reload_path(&invalid),
            Err(LoadError::Invalid(_))
        ));

        assert_eq!(*store.current(), TestParams { gain: 1.0, window: 3 });
        assert_eq!(count.load(Ordering::SeqCst), 0);

        std::fs::remove_file(malformed).ok();
        std::fs::remove_file(invalid).ok();
    }
}
