//! Hierarchical key-value settings stored as a flurry map.
//!
//! Keys are grouped into trees: `"globals.user.name"` names the key `name`
//! inside the section `user` inside the section `globals`. The current
//! section prefix is changed with [`SettingsProvider::enter_section`] and
//! [`SettingsProvider::leave_section`].
//!
//! The file is read on first access and written back by
//! [`SettingsProvider::sync`].

use std::collections::BTreeMap;
use std::fs;
use std::io::ErrorKind as IoErrorKind;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard, PoisonError};

use bytes::Bytes;
use tracing::{debug, warn};

use crate::error::Result;
use crate::flurry::{self, Value};

type Table = BTreeMap<String, Value>;

/// Returns the per-user settings file of an application, creating its
/// directory.
///
/// On macOS this is `$HOME/Library/Preferences/<domain>.<app>.config`,
/// elsewhere `$HOME/.config/<org>/<app>.config`. A directory that cannot be
/// created is logged and otherwise ignored; the error surfaces on the first
/// [`SettingsProvider::sync`].
pub fn settings_file_name(org: &str, domain: &str, app: &str) -> PathBuf {
    let home = std::env::var_os("HOME").map(PathBuf::from).unwrap_or_else(|| {
        warn!("HOME is not set, keeping settings in the working directory");
        PathBuf::from(".")
    });
    let (dir, file) = settings_location(&home, org, domain, app);
    if let Err(err) = fs::create_dir_all(&dir) {
        warn!(dir = %dir.display(), error = %err, "cannot create config file directory");
    }
    dir.join(file)
}

#[cfg(target_os = "macos")]
fn settings_location(home: &Path, _org: &str, domain: &str, app: &str) -> (PathBuf, String) {
    (
        home.join("Library").join("Preferences"),
        format!("{}.{}.config", domain, app),
    )
}

#[cfg(not(target_os = "macos"))]
fn settings_location(home: &Path, org: &str, _domain: &str, app: &str) -> (PathBuf, String) {
    (home.join(".config").join(org), format!("{}.config", app))
}

#[derive(Debug, Default)]
struct State {
    table: Option<Table>,
    sections: Vec<String>,
}

/// Settings backed by one file.
#[derive(Debug)]
pub struct SettingsProvider {
    path: PathBuf,
    state: Mutex<State>,
}

impl SettingsProvider {
    /// Uses the settings file at `path`. Nothing is read until first access.
    pub fn open(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            state: Mutex::new(State::default()),
        }
    }

    /// Uses the per-user settings file of an application.
    pub fn for_application(org: &str, domain: &str, app: &str) -> Self {
        Self::open(settings_file_name(org, domain, app))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Scopes subsequent keys to the section `name` inside the current one.
    pub fn enter_section(&self, name: &str) {
        self.lock().sections.push(name.to_owned());
    }

    /// Returns to the enclosing section. Does nothing at the top level.
    pub fn leave_section(&self) {
        self.lock().sections.pop();
    }

    /// Stores `value` under `key` in the current section.
    ///
    /// Intermediate sections are created; a non-section value in the way is
    /// replaced by a section.
    pub fn set(&self, key: &str, value: impl Into<Value>) -> Result<()> {
        let mut state = self.lock();
        let path = state.key_path(key);
        insert_path(self.table(&mut state)?, &path, value.into());
        Ok(())
    }

    /// Returns the value under `key` in the current section.
    pub fn get(&self, key: &str) -> Result<Option<Value>> {
        let mut state = self.lock();
        let path = state.key_path(key);
        let Some((last, parents)) = path.split_last() else {
            return Ok(None);
        };
        let mut table: &Table = self.table(&mut state)?;
        for section in parents {
            match table.get(section).and_then(Value::as_map) {
                Some(nested) => table = nested,
                None => return Ok(None),
            }
        }
        Ok(table.get(last).cloned())
    }

    /// The string under `key`; `None` if absent or not a string.
    pub fn get_string(&self, key: &str) -> Result<Option<String>> {
        Ok(self.get(key)?.and_then(|v| v.as_str().map(str::to_owned)))
    }

    /// The blob under `key`; `None` if absent or not a blob.
    pub fn get_bytes(&self, key: &str) -> Result<Option<Bytes>> {
        Ok(self.get(key)?.and_then(|v| v.as_bytes().cloned()))
    }

    /// The unsigned integer under `key`; `None` if absent, not an integer or negative.
    pub fn get_uint(&self, key: &str) -> Result<Option<u64>> {
        Ok(self.get(key)?.and_then(|v| v.as_u64()))
    }

    /// The signed integer under `key`; `None` if absent, not an integer or above `i64::MAX`.
    pub fn get_int(&self, key: &str) -> Result<Option<i64>> {
        Ok(self.get(key)?.and_then(|v| v.as_i64()))
    }

    /// Writes the settings back to the file if they were loaded.
    pub fn sync(&self) -> Result<()> {
        let state = self.lock();
        let Some(table) = state.table.as_ref() else {
            return Ok(());
        };
        let data = flurry::to_vec(table)?;
        fs::write(&self.path, &data)?;
        debug!(path = %self.path.display(), len = data.len(), "settings written");
        Ok(())
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn table<'s>(&self, state: &'s mut State) -> Result<&'s mut Table> {
        if state.table.is_none() {
            state.table = Some(self.load()?);
        }
        Ok(state.table.get_or_insert_with(Table::new))
    }

    fn load(&self) -> Result<Table> {
        let data = match fs::read(&self.path) {
            Ok(data) => data,
            Err(err) if err.kind() == IoErrorKind::NotFound => {
                debug!(path = %self.path.display(), "no settings file, starting empty");
                return Ok(Table::new());
            }
            Err(err) => return Err(err.into()),
        };
        if data.is_empty() {
            return Ok(Table::new());
        }
        let table: Table = flurry::from_slice(&data)?;
        debug!(path = %self.path.display(), keys = table.len(), "settings loaded");
        Ok(table)
    }
}

impl State {
    fn key_path(&self, key: &str) -> Vec<String> {
        self.sections
            .iter()
            .flat_map(|section| components(section))
            .chain(components(key))
            .map(str::to_owned)
            .collect()
    }
}

fn insert_path(table: &mut Table, path: &[String], value: Value) {
    match path {
        [] => {}
        [last] => {
            table.insert(last.clone(), value);
        }
        [section, rest @ ..] => {
            let entry = table
                .entry(section.clone())
                .or_insert_with(|| Value::Map(Table::new()));
            match entry {
                Value::Map(nested) => insert_path(nested, rest, value),
                other => {
                    let mut nested = Table::new();
                    insert_path(&mut nested, rest, value);
                    *other = Value::Map(nested);
                }
            }
        }
    }
}

fn components(key: &str) -> impl Iterator<Item = &str> {
    key.split('.').filter(|part| !part.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;

    fn temp_path(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!("arsenal-{}-{}", std::process::id(), name))
    }

    #[test]
    #[cfg(not(target_os = "macos"))]
    fn test_settings_location() {
        let (dir, file) = settings_location(Path::new("/home/u"), "Atta", "net.atta", "sss");
        assert_eq!(dir, Path::new("/home/u/.config/Atta"));
        assert_eq!(file, "sss.config");
    }

    #[test]
    #[cfg(target_os = "macos")]
    fn test_settings_location() {
        let (dir, file) = settings_location(Path::new("/Users/u"), "Atta", "net.atta", "sss");
        assert_eq!(dir, Path::new("/Users/u/Library/Preferences"));
        assert_eq!(file, "net.atta.sss.config");
    }

    #[test]
    fn test_missing_file_is_empty() {
        let settings = SettingsProvider::open(temp_path("missing.config"));
        assert_eq!(settings.get("anything").unwrap(), None);
        assert_eq!(settings.get_string("a.b.c").unwrap(), None);
    }

    #[test]
    fn test_dotted_keys_are_nested() {
        let settings = SettingsProvider::open(temp_path("unused-nested.config"));
        settings.set("globals.user.name", "alice").unwrap();
        settings.set("globals.user.uid", 1000u32).unwrap();

        assert_eq!(
            settings.get_string("globals.user.name").unwrap().as_deref(),
            Some("alice")
        );
        let user = settings.get("globals.user").unwrap().unwrap();
        assert_eq!(user.as_map().unwrap().len(), 2);
        assert_eq!(settings.get_uint("globals.user.uid").unwrap(), Some(1000));
    }

    #[test]
    fn test_sections_scope_keys() {
        let settings = SettingsProvider::open(temp_path("unused-sections.config"));
        settings.enter_section("globals");
        settings.enter_section("user");
        settings.set("name", "a").unwrap();
        assert_eq!(settings.get_string("name").unwrap().as_deref(), Some("a"));
        settings.leave_section();
        assert_eq!(settings.get_string("user.name").unwrap().as_deref(), Some("a"));
        settings.leave_section();
        settings.leave_section();
        settings.enter_section("globals.user");
        assert_eq!(settings.get_string("name").unwrap().as_deref(), Some("a"));
        settings.leave_section();
        assert_eq!(
            settings.get_string("globals.user.name").unwrap().as_deref(),
            Some("a")
        );
    }

    #[test]
    fn test_typed_getters() {
        let settings = SettingsProvider::open(temp_path("unused-typed.config"));
        settings.set("neg", -5i64).unwrap();
        settings.set("blob", Bytes::from_static(b"\x01\x02")).unwrap();
        settings.set("text", "x").unwrap();

        assert_eq!(settings.get_int("neg").unwrap(), Some(-5));
        assert_eq!(settings.get_uint("neg").unwrap(), None);
        assert_eq!(
            settings.get_bytes("blob").unwrap(),
            Some(Bytes::from_static(b"\x01\x02"))
        );
        assert_eq!(settings.get_int("text").unwrap(), None);
    }

    #[test]
    fn test_value_replaced_by_section() {
        let settings = SettingsProvider::open(temp_path("unused-replace.config"));
        settings.set("a", 1u8).unwrap();
        settings.set("a.b", 2u8).unwrap();
        assert_eq!(settings.get_uint("a.b").unwrap(), Some(2));
    }

    #[test]
    fn test_sync_and_reload() {
        let path = temp_path("sync.config");
        let _ = fs::remove_file(&path);

        let settings = SettingsProvider::open(&path);
        settings.set("window.width", 800u16).unwrap();
        settings.set("window.title", "main").unwrap();
        settings.sync().unwrap();

        let reloaded = SettingsProvider::open(&path);
        assert_eq!(reloaded.get_uint("window.width").unwrap(), Some(800));
        assert_eq!(
            reloaded.get_string("window.title").unwrap().as_deref(),
            Some("main")
        );
        fs::remove_file(&path).unwrap();
    }

    #[test]
    fn test_sync_without_access_writes_nothing() {
        let path = temp_path("untouched.config");
        let _ = fs::remove_file(&path);
        SettingsProvider::open(&path).sync().unwrap();
        assert!(!path.exists());
    }

    #[test]
    fn test_corrupt_file() {
        let path = temp_path("corrupt.config");
        fs::write(&path, [0xc1]).unwrap();
        let settings = SettingsProvider::open(&path);
        let err = settings.get("a").unwrap_err();
        fs::remove_file(&path).unwrap();
        assert!(matches!(err, Error::InvalidTag(0xc1)));
    }
}
