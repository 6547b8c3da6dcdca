//! Shared test utilities: an in-process stand-in for the prediction service.

#![allow(dead_code)]

use std::collections::{HashMap, VecDeque};
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

use tradex::credentials::SessionContext;
use tradex::gateway::Gateway;
use tradex::models::Direction;
use tradex::models::history::HistoryEntry;
use tradex::models::prediction::PredictionResult;
use tradex::models::user::{CurrentUser, PendingUser, UserId};
use tradex::{Result, TradexError};
use zeroize::Zeroizing;

pub const ADMIN_EMAIL: &str = "admin@example.com";
pub const TRADER_EMAIL: &str = "a@b.com";
pub const PASSWORD: &str = "pw";

struct Account {
    id: UserId,
    email: String,
    password: String,
    approved: bool,
    admin: bool,
}

#[derive(Default)]
struct Service {
    next_id: UserId,
    next_token: u64,
    accounts: Vec<Account>,
    live_tokens: HashMap<String, UserId>,
    history: Vec<HistoryEntry>,
    unreachable: bool,
    fail_predictions: bool,
    fail_history: bool,
    prediction_delays: VecDeque<Duration>,
    history_delays: VecDeque<Duration>,
    calls: HashMap<&'static str, usize>,
}

impl Service {
    fn record(&mut self, op: &'static str) {
        *self.calls.entry(op).or_default() += 1;
    }

    /// Resolves the bearer token the client attached, like the real
    /// service does for every authenticated route.
    fn caller(&self, token: Option<Zeroizing<String>>) -> Result<&Account> {
        if self.unreachable {
            return Err(TradexError::Network("connection refused".into()));
        }
        let id = token
            .and_then(|t| self.live_tokens.get(t.as_str()).copied())
            .ok_or(TradexError::Unauthorized)?;
        self.accounts
            .iter()
            .find(|a| a.id == id)
            .ok_or(TradexError::Unauthorized)
    }

    fn admin(&self, token: Option<Zeroizing<String>>) -> Result<&Account> {
        let account = self.caller(token)?;
        if account.admin {
            Ok(account)
        } else {
            Err(TradexError::Forbidden {
                detail: Some("Admin privileges required".into()),
            })
        }
    }
}

/// Fake gateway backed by an in-memory account table.
///
/// Like [`tradex::gateway::GatewayClient`], it reads the bearer token from
/// the session context on every call and stores the token on login.
pub struct FakeGateway {
    session: SessionContext,
    service: Mutex<Service>,
}

impl FakeGateway {
    pub fn new(session: SessionContext) -> Self {
        Self {
            session,
            service: Mutex::new(Service {
                next_id: 1,
                ..Service::default()
            }),
        }
    }

    /// A fake with one approved trader and one approved admin.
    pub fn seeded(session: SessionContext) -> Self {
        let fake = Self::new(session);
        fake.add_account(ADMIN_EMAIL, PASSWORD, true, true);
        fake.add_account(TRADER_EMAIL, PASSWORD, true, false);
        fake
    }

    pub fn add_account(&self, email: &str, password: &str, approved: bool, admin: bool) -> UserId {
        let mut service = self.lock();
        let id = service.next_id;
        service.next_id += 1;
        service.accounts.push(Account {
            id,
            email: email.to_string(),
            password: password.to_string(),
            approved,
            admin,
        });
        id
    }

    /// Invalidates every issued token, as if they all expired.
    pub fn expire_tokens(&self) {
        self.lock().live_tokens.clear();
    }

    pub fn set_unreachable(&self, unreachable: bool) {
        self.lock().unreachable = unreachable;
    }

    pub fn fail_predictions(&self, fail: bool) {
        self.lock().fail_predictions = fail;
    }

    pub fn fail_history(&self, fail: bool) {
        self.lock().fail_history = fail;
    }

    pub fn delay_next_prediction(&self, delay: Duration) {
        self.lock().prediction_delays.push_back(delay);
    }

    pub fn delay_next_history(&self, delay: Duration) {
        self.lock().history_delays.push_back(delay);
    }

    pub fn calls(&self, op: &str) -> usize {
        self.lock().calls.get(op).copied().unwrap_or(0)
    }

    pub fn history_len(&self) -> usize {
        self.lock().history.len()
    }

    fn lock(&self) -> MutexGuard<'_, Service> {
        self.service.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl Gateway for FakeGateway {
    async fn login(&self, email: &str, password: &str) -> Result<Zeroizing<String>> {
        let token = {
            let mut service = self.lock();
            service.record("login");
            if service.unreachable {
                return Err(TradexError::Network("connection refused".into()));
            }
            let (id, approved) = service
                .accounts
                .iter()
                .find(|a| a.email == email && a.password == password)
                .map(|a| (a.id, a.approved))
                .ok_or_else(|| TradexError::Auth {
                    detail: Some("Incorrect email or password".into()),
                })?;
            if !approved {
                return Err(TradexError::Auth {
                    detail: Some("Account pending admin approval".into()),
                });
            }
            service.next_token += 1;
            let token = format!("token-{id}-{}", service.next_token);
            service.live_tokens.insert(token.clone(), id);
            token
        };
        self.session.set(&token)?;
        Ok(Zeroizing::new(token))
    }

    async fn register(&self, email: &str, password: &str) -> Result<()> {
        let mut service = self.lock();
        service.record("register");
        if !email.contains('@') {
            return Err(TradexError::Validation {
                detail: Some("value is not a valid email address".into()),
            });
        }
        if service.accounts.iter().any(|a| a.email == email) {
            return Err(TradexError::Validation {
                detail: Some("Email already registered".into()),
            });
        }
        let id = service.next_id;
        service.next_id += 1;
        service.accounts.push(Account {
            id,
            email: email.to_string(),
            password: password.to_string(),
            approved: false,
            admin: false,
        });
        Ok(())
    }

    async fn who_am_i(&self) -> Result<CurrentUser> {
        let mut service = self.lock();
        service.record("who_am_i");
        let account = service.caller(self.session.get())?;
        Ok(CurrentUser {
            id: Some(account.id),
            email: Some(account.email.clone()),
            is_active: Some(true),
            is_superuser: account.admin,
        })
    }

    async fn run_prediction(
        &self,
        symbol: &str,
        _interval: &str,
        _period: &str,
    ) -> Result<PredictionResult> {
        let delay = {
            let mut service = self.lock();
            service.record("run_prediction");
            service.caller(self.session.get())?;
            service.prediction_delays.pop_front()
        };
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        let mut service = self.lock();
        if service.fail_predictions {
            return Err(TradexError::Service {
                status: 500,
                detail: Some("model unavailable".into()),
            });
        }
        let result = prediction(symbol);
        let timestamp = format!("2025-01-15T10:{:02}:00Z", service.history.len());
        service.history.insert(
            0,
            HistoryEntry {
                timestamp,
                symbol: result.symbol.clone(),
                predicted_direction: result.prediction,
                current_price: result.current_price,
                suggested_strategy: result.strategy.clone(),
            },
        );
        Ok(result)
    }

    async fn list_my_history(&self) -> Result<Vec<HistoryEntry>> {
        let delay = {
            let mut service = self.lock();
            service.record("list_my_history");
            service.caller(self.session.get())?;
            service.history_delays.pop_front()
        };
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        let service = self.lock();
        if service.fail_history {
            return Err(TradexError::Service {
                status: 503,
                detail: None,
            });
        }
        Ok(service.history.clone())
    }

    async fn list_pending_users(&self) -> Result<Vec<PendingUser>> {
        let mut service = self.lock();
        service.record("list_pending_users");
        service.admin(self.session.get())?;
        Ok(service
            .accounts
            .iter()
            .filter(|a| !a.approved)
            .map(|a| PendingUser {
                id: a.id,
                email: a.email.clone(),
            })
            .collect())
    }

    async fn approve_user(&self, id: UserId) -> Result<()> {
        let mut service = self.lock();
        service.record("approve_user");
        service.admin(self.session.get())?;
        let account = service
            .accounts
            .iter_mut()
            .find(|a| a.id == id && !a.approved)
            .ok_or(TradexError::NotFound {
                detail: Some("User not found".into()),
            })?;
        account.approved = true;
        Ok(())
    }
}

/// A deterministic prediction for `symbol`.
pub fn prediction(symbol: &str) -> PredictionResult {
    PredictionResult {
        symbol: symbol.to_string(),
        prediction: Direction::Bullish,
        confidence: 0.7,
        rsi: 55.0,
        macd: 1.5,
        current_price: 100.0,
        sma_50: 95.0,
        strategy: "Bull Call Spread".into(),
        strike: None,
        option_type: None,
        payoff_graph: Vec::new(),
        hft_risk: None,
        reasoning: None,
        poc: None,
    }
}
