use std::fs;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::Path;

use tracing::debug;

use crate::error::AppError;

#[cfg(unix)]
use std::os::unix::fs::PermissionsExt;

#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct User {
    pub id: String,
    pub email: String,
}

#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub access_token: String,
    pub user: User,
}

/// Client for the external identity collaborator.
pub struct AuthClient {
    http: reqwest::blocking::Client,
    base_url: String,
}

impl AuthClient {
    pub fn new(base_url: &str) -> Result<Self, AppError> {
        let http = reqwest::blocking::Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .build()
            .map_err(|e| AppError::Network(e.to_string()))?;
        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn sign_in_with_password(&self, email: &str, password: &str) -> Result<Session, AppError> {
        let url = format!("{}/auth/sign-in", self.base_url);
        debug!(url = %url, email = %email, "signing in");

        let response = self
            .http
            .post(&url)
            .json(&serde_json::json!({ "email": email, "password": password }))
            .send()
            .map_err(transport_error)?;

        let status = response.status();
        if !status.is_success() {
            let message = crate::api::error_detail(response);
            return Err(AppError::auth(format!("Sign-in failed: {}", message)));
        }

        response
            .json::<Session>()
            .map_err(|e| AppError::auth(format!("Malformed sign-in response: {}", e)))
    }

    /// Best effort: the server-side session is revoked, but a failure here
    /// must not keep the user signed in locally.
    pub fn sign_out(&self, session: &Session) -> Result<(), AppError> {
        let url = format!("{}/auth/sign-out", self.base_url);
        let response = self
            .http
            .post(&url)
            .bearer_auth(&session.access_token)
            .send()
            .map_err(transport_error)?;

        if !response.status().is_success() {
            debug!(status = %response.status(), "server-side sign-out failed");
        }
        Ok(())
    }
}

fn transport_error(e: reqwest::Error) -> AppError {
    AppError::Network(e.to_string())
}

type SessionSubscriber = Box<dyn Fn(Option<&Session>)>;

/// File-backed session state. Saving or clearing notifies every subscriber,
/// which is how the habit cache learns the user changed.
pub struct SessionStore {
    path: String,
    current: Option<Session>,
    subscribers: Vec<SessionSubscriber>,
}

impl SessionStore {
    pub fn open(path: &str) -> Result<Self, AppError> {
        let current = match fs::read_to_string(path) {
            Ok(txt) => Some(
                serde_json::from_str(&txt)
                    .map_err(|_| AppError::io("Session file is corrupted; run `habitdash logout`"))?,
            ),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => None,
            Err(_) => return Err(AppError::io("Cannot read session file")),
        };
        Ok(Self {
            path: path.to_string(),
            current,
            subscribers: Vec::new(),
        })
    }

    pub fn subscribe(&mut self, f: impl Fn(Option<&Session>) + 'static) {
        self.subscribers.push(Box::new(f));
    }

    pub fn current_user(&self) -> Option<&User> {
        self.current.as_ref().map(|s| &s.user)
    }

    pub fn current(&self) -> Option<&Session> {
        self.current.as_ref()
    }

    /// The session required by every habit command.
    pub fn require(&self) -> Result<&Session, AppError> {
        self.current
            .as_ref()
            .ok_or_else(|| AppError::auth("Not signed in. Run `habitdash login` first."))
    }

    pub fn save(&mut self, session: Session) -> Result<(), AppError> {
        write_session_file(&self.path, &session)?;
        debug!(user = %session.user.email, "session saved");
        self.current = Some(session);
        self.notify();
        Ok(())
    }

    pub fn clear(&mut self) -> Result<(), AppError> {
        match fs::remove_file(&self.path) {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(_) => return Err(AppError::io("Cannot remove session file")),
        }
        debug!("session cleared");
        self.current = None;
        self.notify();
        Ok(())
    }

    fn notify(&self) {
        for f in &self.subscribers {
            f(self.current.as_ref());
        }
    }
}

/// Atomic write with owner-only permissions; the file holds a bearer token.
fn write_session_file(path: &str, session: &Session) -> Result<(), AppError> {
    let dir = Path::new(path)
        .parent()
        .ok_or_else(|| AppError::io("Cannot resolve session directory"))?;
    fs::create_dir_all(dir).map_err(|_| AppError::io("Cannot create session directory"))?;

    #[cfg(unix)]
    {
        let _ = fs::set_permissions(dir, fs::Permissions::from_mode(0o700));
    }

    let tmp_path = dir.join(format!(".session.json.tmp.{}", std::process::id()));
    let data = serde_json::to_string_pretty(session)
        .map_err(|_| AppError::io("Cannot encode session"))?
        + "\n";

    {
        let mut f = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .open(&tmp_path)
            .map_err(|_| AppError::io("Cannot write session file"))?;

        #[cfg(unix)]
        {
            let _ = f.set_permissions(fs::Permissions::from_mode(0o600));
        }

        f.write_all(data.as_bytes())
            .map_err(|_| AppError::io("Cannot write session file"))?;
        let _ = f.flush();
    }

    fs::rename(&tmp_path, path).map_err(|_| {
        let _ = fs::remove_file(&tmp_path);
        AppError::io("Cannot write session file")
    })?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use std::rc::Rc;

    fn session() -> Session {
        Session {
            access_token: "tok".to_string(),
            user: User {
                id: "u1".to_string(),
                email: "a@b.c".to_string(),
            },
        }
    }

    #[test]
    fn save_then_reopen_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.json");
        let path = path.to_str().unwrap();

        let mut store = SessionStore::open(path).unwrap();
        assert!(store.current_user().is_none());
        store.save(session()).unwrap();

        let reopened = SessionStore::open(path).unwrap();
        assert_eq!(reopened.current_user().unwrap().id, "u1");
    }

    #[test]
    fn clear_removes_file_and_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.json");
        let path = path.to_str().unwrap();

        let mut store = SessionStore::open(path).unwrap();
        store.save(session()).unwrap();
        store.clear().unwrap();
        store.clear().unwrap();
        assert!(store.require().is_err());
    }

    #[test]
    fn subscribers_see_every_change() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.json");

        let mut store = SessionStore::open(path.to_str().unwrap()).unwrap();
        let seen = Rc::new(Cell::new(0u32));
        let seen_in_callback = Rc::clone(&seen);
        store.subscribe(move |_| seen_in_callback.set(seen_in_callback.get() + 1));

        store.save(session()).unwrap();
        store.clear().unwrap();
        assert_eq!(seen.get(), 2);
    }
}
