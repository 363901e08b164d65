use std::path::{Path, PathBuf};
use std::sync::Mutex;

static ENV_LOCK: Mutex<()> = Mutex::new(());

/// Runs `f` with one environment variable set (`Some`) or removed (`None`),
/// restoring the previous value afterwards, even on panic.
///
/// Tests in one binary run in parallel, so access to the process
/// environment is serialized through `ENV_LOCK`.
#[allow(dead_code)]
pub fn with_env_var<F, R>(key: &str, value: Option<&str>, f: F) -> R
where
    F: FnOnce() -> R,
{
    let _lock = ENV_LOCK.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
    let _restore = RestoreVar::set(key, value);
    f()
}

struct RestoreVar {
    key: String,
    previous: Option<String>,
}

impl RestoreVar {
    fn set(key: &str, value: Option<&str>) -> Self {
        let previous = std::env::var(key).ok();
        match value {
            Some(v) => std::env::set_var(key, v),
            None => std::env::remove_var(key),
        }
        Self {
            key: key.to_string(),
            previous,
        }
    }
}

impl Drop for RestoreVar {
    fn drop(&mut self) {
        match self.previous.take() {
            Some(v) => std::env::set_var(&self.key, v),
            None => std::env::remove_var(&self.key),
        }
    }
}

/// Runs `f` with `dir` as the working directory, restoring the previous one
/// afterwards, even on panic. Shares `ENV_LOCK` with [`with_env_var`].
#[allow(dead_code)]
pub fn with_current_dir<F, R>(dir: &Path, f: F) -> R
where
    F: FnOnce() -> R,
{
    let _lock = ENV_LOCK.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
    let _restore = RestoreDir::enter(dir);
    f()
}

struct RestoreDir {
    previous: PathBuf,
}

impl RestoreDir {
    fn enter(dir: &Path) -> Self {
        let previous = std::env::current_dir().expect("current directory is readable");
        std::env::set_current_dir(dir).expect("test directory exists");
        Self { previous }
    }
}

impl Drop for RestoreDir {
    fn drop(&mut self) {
        let _ = std::env::set_current_dir(&self.previous);
    }
}

/// Block used by the end-to-end tests: two scripts, one airmass limit.
#[allow(dead_code)]
pub fn sitcom_block() -> ts_observing::ObservingBlock {
    use serde_json::json;
    use ts_observing::{AirmassConstraint, ObservingBlock, ObservingScript};

    let slew = ObservingScript::new("slew", true, Default::default())
        .with_parameter("target", json!("W48"));
    let visit = ObservingScript::new("standard_visit", false, Default::default())
        .with_parameter("exptime", json!(30.0));

    ObservingBlock::builder("OBS-123", "SITCOM-456")
        .scripts([slew, visit])
        .constraint(AirmassConstraint::new(1.5).expect("valid airmass"))
        .build()
}
