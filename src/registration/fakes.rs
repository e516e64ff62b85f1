//! In-process collaborators for workflow tests.

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tokio::sync::Notify;

use crate::auth::{AuthClient, AuthIdentity, AuthSession};
use crate::error::CollaboratorError;
use crate::storage::StorageClient;

#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    SignUp {
        email: String,
        password: String,
    },
    User {
        access_token: String,
    },
    Insert {
        table: String,
        rows: serde_json::Value,
        access_token: Option<String>,
    },
}

/// Ordered log of collaborator calls, shared by the fakes of one test.
#[derive(Clone, Default)]
pub struct Recorder(Arc<Mutex<Vec<Call>>>);

impl Recorder {
    pub fn calls(&self) -> Vec<Call> {
        self.0.lock().unwrap().clone()
    }

    fn push(&self, call: Call) {
        self.0.lock().unwrap().push(call);
    }
}

pub struct FakeAuth {
    rec: Recorder,
    ids: Mutex<VecDeque<String>>,
    failure: Option<String>,
    session: Option<AuthSession>,
    gate: Option<Arc<Notify>>,
    /// Access token -> identity id, for `user`.
    tokens: HashMap<String, String>,
}

impl FakeAuth {
    /// Succeeds, handing out `ids` in order.
    pub fn ok<const N: usize>(rec: &Recorder, ids: [&str; N]) -> Self {
        Self {
            rec: rec.clone(),
            ids: Mutex::new(ids.iter().map(|s| s.to_string()).collect()),
            failure: None,
            session: None,
            gate: None,
            tokens: HashMap::new(),
        }
    }

    pub fn failing(rec: &Recorder, message: &str) -> Self {
        Self {
            failure: Some(message.to_string()),
            ..Self::ok(rec, [])
        }
    }

    /// Succeeds with `id` once the returned handle is notified.
    pub fn gated(rec: &Recorder, id: &str) -> (Self, Arc<Notify>) {
        let gate = Arc::new(Notify::new());
        let auth = Self {
            gate: Some(gate.clone()),
            ..Self::ok(rec, [id])
        };
        (auth, gate)
    }

    pub fn with_session(mut self, session: AuthSession) -> Self {
        self.session = Some(session);
        self
    }

    /// Makes `user(token)` resolve to identity `id`; other tokens are rejected.
    pub fn with_token(mut self, token: &str, id: &str) -> Self {
        self.tokens.insert(token.to_string(), id.to_string());
        self
    }
}

#[async_trait]
impl AuthClient for FakeAuth {
    async fn sign_up(&self, email: &str, password: &str) -> Result<AuthIdentity, CollaboratorError> {
        self.rec.push(Call::SignUp {
            email: email.to_string(),
            password: password.to_string(),
        });
        if let Some(gate) = &self.gate {
            gate.notified().await;
        }
        if let Some(message) = &self.failure {
            return Err(CollaboratorError::new(message.clone()).with_status(422));
        }
        let id = self
            .ids
            .lock()
            .unwrap()
            .pop_front()
            .expect("FakeAuth ran out of ids");
        Ok(AuthIdentity {
            id,
            email: Some(email.to_string()),
            session: self.session.clone(),
        })
    }

    async fn user(&self, access_token: &str) -> Result<AuthIdentity, CollaboratorError> {
        self.rec.push(Call::User {
            access_token: access_token.to_string(),
        });
        let Some(id) = self.tokens.get(access_token) else {
            return Err(CollaboratorError::new("invalid JWT")
                .with_status(401)
                .with_code("bad_jwt"));
        };
        Ok(AuthIdentity {
            id: id.clone(),
            email: None,
            session: Some(AuthSession {
                access_token: access_token.to_string(),
                refresh_token: None,
                expires_at: None,
            }),
        })
    }
}

pub struct FakeStorage {
    rec: Recorder,
    failure: Option<String>,
    /// Remaining failing calls; `None` fails forever when `failure` is set.
    failures_left: Mutex<Option<usize>>,
    gate: Option<Arc<Notify>>,
}

impl FakeStorage {
    pub fn ok(rec: &Recorder) -> Self {
        Self {
            rec: rec.clone(),
            failure: None,
            failures_left: Mutex::new(None),
            gate: None,
        }
    }

    pub fn failing(rec: &Recorder, message: &str) -> Self {
        Self {
            failure: Some(message.to_string()),
            ..Self::ok(rec)
        }
    }

    pub fn failing_times(rec: &Recorder, message: &str, times: usize) -> Self {
        Self {
            failures_left: Mutex::new(Some(times)),
            ..Self::failing(rec, message)
        }
    }

    /// Succeeds once the returned handle is notified.
    pub fn gated(rec: &Recorder) -> (Self, Arc<Notify>) {
        let gate = Arc::new(Notify::new());
        let storage = Self {
            gate: Some(gate.clone()),
            ..Self::ok(rec)
        };
        (storage, gate)
    }
}

#[async_trait]
impl StorageClient for FakeStorage {
    async fn insert(
        &self,
        table: &str,
        rows: serde_json::Value,
        access_token: Option<&str>,
    ) -> Result<(), CollaboratorError> {
        self.rec.push(Call::Insert {
            table: table.to_string(),
            rows,
            access_token: access_token.map(str::to_string),
        });
        if let Some(gate) = &self.gate {
            gate.notified().await;
        }
        let Some(message) = &self.failure else {
            return Ok(());
        };
        let mut left = self.failures_left.lock().unwrap();
        match left.as_mut() {
            Some(0) => Ok(()),
            Some(n) => {
                *n -= 1;
                Err(CollaboratorError::new(message.clone()).with_status(409))
            }
            None => Err(CollaboratorError::new(message.clone()).with_status(409)),
        }
    }
}
