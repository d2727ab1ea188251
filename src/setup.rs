//! Database setup and diagnostics for the hosted store.
//!
//! Every routine logs what it does and returns a small report so the CLI
//! can print a summary.

use crate::error::StoreResult;
use crate::persistence::{GameTheme, RemoteClient, RemoteStoreItem, RemoteUser, UserStats};
use crate::store::{StoreItem, CATALOG};
use serde_json::{json, Value};

pub const TEST_USERNAME: &str = "testuser";
pub const TEST_EMAIL: &str = "test@flappybird.local";
pub const TEST_PASSWORD: &str = "testpass123";

/// The remote calls the setup routines need.
pub trait SetupBackend {
    fn get_store_items(&self) -> StoreResult<Vec<RemoteStoreItem>>;
    fn insert_store_item(&self, row: Value) -> StoreResult<RemoteStoreItem>;
    fn create_user(&self, username: &str, password: &str, email: Option<&str>)
        -> StoreResult<RemoteUser>;
    fn login_user(&self, email: &str, password: &str) -> StoreResult<RemoteUser>;
    fn get_current_user(&self) -> StoreResult<Option<RemoteUser>>;
    fn purchase_item(&self, user_id: &str, item_id: &str) -> StoreResult<bool>;
    fn get_game_themes(&self) -> StoreResult<Vec<GameTheme>>;
    fn get_user_stats(&self, user_id: &str) -> StoreResult<UserStats>;
}

impl SetupBackend for RemoteClient {
    fn get_store_items(&self) -> StoreResult<Vec<RemoteStoreItem>> {
        RemoteClient::get_store_items(self)
    }

    fn insert_store_item(&self, row: Value) -> StoreResult<RemoteStoreItem> {
        RemoteClient::insert_store_item(self, row)
    }

    fn create_user(
        &self,
        username: &str,
        password: &str,
        email: Option<&str>,
    ) -> StoreResult<RemoteUser> {
        RemoteClient::create_user(self, username, password, email)
    }

    fn login_user(&self, email: &str, password: &str) -> StoreResult<RemoteUser> {
        RemoteClient::login_user(self, email, password)
    }

    fn get_current_user(&self) -> StoreResult<Option<RemoteUser>> {
        RemoteClient::get_current_user(self)
    }

    fn purchase_item(&self, user_id: &str, item_id: &str) -> StoreResult<bool> {
        RemoteClient::purchase_item(self, user_id, item_id)
    }

    fn get_game_themes(&self) -> StoreResult<Vec<GameTheme>> {
        RemoteClient::get_game_themes(self)
    }

    fn get_user_stats(&self, user_id: &str) -> StoreResult<UserStats> {
        RemoteClient::get_user_stats(self, user_id)
    }
}

/// `store_items` row for a catalog entry.
pub fn catalog_row(item: &StoreItem) -> Value {
    json!({
        "name": item.name,
        "description": item.description,
        "item_type": item.item_type,
        "price": item.price,
        "icon": item.icon,
        "rarity": item.rarity,
        "effects": serde_json::from_str::<Value>(item.effects).unwrap_or(Value::Null),
    })
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct SeedReport {
    /// Items already existed; nothing was inserted.
    pub skipped: bool,
    pub created: Vec<String>,
    pub failed: Vec<(String, String)>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreCheck {
    pub item_count: usize,
    /// Name of the item bought and whether the store accepted it.
    pub purchase: Option<(String, bool)>,
}

#[derive(Debug, Default)]
pub struct SetupReport {
    pub item_count: usize,
    pub seed: Option<SeedReport>,
    pub test_user: Option<RemoteUser>,
    pub authenticated: bool,
    pub store: Option<StoreCheck>,
}

#[derive(Debug)]
pub struct StatusReport {
    pub store_items: Result<usize, String>,
    pub themes: Result<usize, String>,
    pub current_user: Option<String>,
    pub stats: Option<UserStats>,
}

pub struct DatabaseSetup<B> {
    backend: B,
}

impl<B: SetupBackend> DatabaseSetup<B> {
    pub fn new(backend: B) -> Self {
        Self { backend }
    }

    /// Returns the number of store items visible.
    pub fn test_connection(&self) -> StoreResult<usize> {
        tracing::info!("testing database connection");
        match self.backend.get_store_items() {
            Ok(items) => {
                tracing::info!(store_items = items.len(), "database connection ok");
                Ok(items.len())
            }
            Err(e) => {
                tracing::error!(error = %e, "database connection failed");
                Err(e)
            }
        }
    }

    /// Insert the built-in catalog unless the store already has items.
    /// Individual insert failures are collected, not fatal.
    pub fn initialize_sample_data(&self) -> StoreResult<SeedReport> {
        let existing = self.backend.get_store_items()?;
        if !existing.is_empty() {
            tracing::info!(existing = existing.len(), "sample data already present, skipping");
            return Ok(SeedReport {
                skipped: true,
                ..SeedReport::default()
            });
        }

        let mut report = SeedReport::default();
        for item in CATALOG.iter() {
            match self.backend.insert_store_item(catalog_row(item)) {
                Ok(_) => {
                    tracing::info!(item = item.name, "created store item");
                    report.created.push(item.name.to_string());
                }
                Err(e) => {
                    tracing::warn!(item = item.name, error = %e, "failed to create store item");
                    report.failed.push((item.name.to_string(), e.to_string()));
                }
            }
        }
        Ok(report)
    }

    pub fn create_test_user(&self) -> StoreResult<RemoteUser> {
        let user = self
            .backend
            .create_user(TEST_USERNAME, TEST_PASSWORD, Some(TEST_EMAIL))?;
        tracing::info!(username = %user.username, email = TEST_EMAIL, "test user created");
        Ok(user)
    }

    pub fn test_authentication(&self) -> StoreResult<RemoteUser> {
        let user = self.backend.login_user(TEST_EMAIL, TEST_PASSWORD)?;
        tracing::info!(username = %user.username, coins = user.coins, "authentication ok");
        Ok(user)
    }

    /// List items and, when a user is given, try to buy the first one.
    pub fn test_store_operations(&self, user: Option<&RemoteUser>) -> StoreResult<StoreCheck> {
        let items = self.backend.get_store_items()?;
        let mut check = StoreCheck {
            item_count: items.len(),
            purchase: None,
        };

        if let (Some(user), Some(first)) = (user, items.first()) {
            let accepted = self.backend.purchase_item(&user.id, &first.id)?;
            tracing::info!(item = %first.name, accepted, "test purchase");
            check.purchase = Some((first.name.clone(), accepted));
        }
        Ok(check)
    }

    /// Connection, seed, test user, login, store check. Only a failed
    /// connection aborts; later steps are best effort.
    pub fn run_full_setup(&self) -> StoreResult<SetupReport> {
        let mut report = SetupReport {
            item_count: self.test_connection()?,
            ..SetupReport::default()
        };

        report.seed = self
            .initialize_sample_data()
            .map_err(|e| tracing::warn!(error = %e, "sample data step failed"))
            .ok();

        report.test_user = self
            .create_test_user()
            .map_err(|e| tracing::warn!(error = %e, "test user step failed"))
            .ok();

        let mut logged_in = None;
        if report.test_user.is_some() {
            match self.test_authentication() {
                Ok(user) => {
                    report.authenticated = true;
                    logged_in = Some(user);
                }
                Err(e) => tracing::warn!(error = %e, "authentication step failed"),
            }
        }

        let current = match logged_in {
            Some(user) => Some(user),
            None => self.backend.get_current_user()?,
        };
        report.store = self
            .test_store_operations(current.as_ref())
            .map_err(|e| tracing::warn!(error = %e, "store step failed"))
            .ok();

        tracing::info!("database setup complete");
        Ok(report)
    }

    pub fn show_status(&self) -> StatusReport {
        let store_items = self
            .backend
            .get_store_items()
            .map(|items| items.len())
            .map_err(|e| e.to_string());
        let themes = self
            .backend
            .get_game_themes()
            .map(|themes| themes.len())
            .map_err(|e| e.to_string());

        let current = self.backend.get_current_user().ok().flatten();
        let stats = current
            .as_ref()
            .and_then(|user| self.backend.get_user_stats(&user.id).ok());

        StatusReport {
            store_items,
            themes,
            current_user: current.map(|user| user.username),
            stats,
        }
    }
}

impl<B> DatabaseSetup<B> {
    pub fn backend(&self) -> &B {
        &self.backend
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::StoreError;
    use std::cell::RefCell;

    #[derive(Default)]
    struct FakeBackend {
        items: RefCell<Vec<RemoteStoreItem>>,
        fail_items: bool,
        users: RefCell<Vec<RemoteUser>>,
        purchases: RefCell<Vec<(String, String)>>,
    }

    fn item(id: &str, name: &str) -> RemoteStoreItem {
        RemoteStoreItem {
            id: id.to_string(),
            name: name.to_string(),
            description: String::new(),
            item_type: "skin".to_string(),
            price: 10,
            icon: String::new(),
            rarity: "common".to_string(),
            effects: Value::Null,
            is_active: true,
        }
    }

    impl SetupBackend for FakeBackend {
        fn get_store_items(&self) -> StoreResult<Vec<RemoteStoreItem>> {
            if self.fail_items {
                return Err(StoreError::Transport("connection refused".to_string()));
            }
            Ok(self.items.borrow().clone())
        }

        fn insert_store_item(&self, row: Value) -> StoreResult<RemoteStoreItem> {
            let mut items = self.items.borrow_mut();
            let name = row["name"].as_str().unwrap_or_default().to_string();
            let created = item(&(items.len() + 1).to_string(), &name);
            items.push(created.clone());
            Ok(created)
        }

        fn create_user(
            &self,
            username: &str,
            _password: &str,
            email: Option<&str>,
        ) -> StoreResult<RemoteUser> {
            let user = RemoteUser {
                id: "u1".to_string(),
                username: username.to_string(),
                email: email.map(str::to_string),
                coins: 0,
                best_score: 0,
                current_theme: None,
                is_guest: false,
            };
            self.users.borrow_mut().push(user.clone());
            Ok(user)
        }

        fn login_user(&self, email: &str, _password: &str) -> StoreResult<RemoteUser> {
            self.users
                .borrow()
                .iter()
                .find(|u| u.email.as_deref() == Some(email))
                .cloned()
                .ok_or(StoreError::InvalidCredentials)
        }

        fn get_current_user(&self) -> StoreResult<Option<RemoteUser>> {
            Ok(None)
        }

        fn purchase_item(&self, user_id: &str, item_id: &str) -> StoreResult<bool> {
            self.purchases
                .borrow_mut()
                .push((user_id.to_string(), item_id.to_string()));
            Ok(true)
        }

        fn get_game_themes(&self) -> StoreResult<Vec<GameTheme>> {
            Ok(Vec::new())
        }

        fn get_user_stats(&self, _user_id: &str) -> StoreResult<UserStats> {
            Ok(UserStats::default())
        }
    }

    #[test]
    fn test_catalog_row_shape() {
        let row = catalog_row(&CATALOG[0]);
        assert_eq!(row["name"], "Rainbow Bird");
        assert_eq!(row["item_type"], "skin");
        assert_eq!(row["rarity"], "common");
        assert_eq!(row["effects"]["color"], "rainbow");
    }

    #[test]
    fn test_seed_inserts_whole_catalog_once() {
        let setup = DatabaseSetup::new(FakeBackend::default());
        let first = setup.initialize_sample_data().unwrap();
        assert!(!first.skipped);
        assert_eq!(first.created.len(), CATALOG.len());

        let second = setup.initialize_sample_data().unwrap();
        assert!(second.skipped);
        assert_eq!(setup.backend().items.borrow().len(), CATALOG.len());
    }

    #[test]
    fn test_full_setup_aborts_on_connection_failure() {
        let setup = DatabaseSetup::new(FakeBackend {
            fail_items: true,
            ..FakeBackend::default()
        });
        assert!(matches!(
            setup.run_full_setup(),
            Err(StoreError::Transport(_))
        ));
    }

    #[test]
    fn test_full_setup_logs_in_and_buys_first_item() {
        let setup = DatabaseSetup::new(FakeBackend::default());
        let report = setup.run_full_setup().unwrap();
        assert_eq!(report.item_count, 0);
        assert_eq!(report.seed.unwrap().created.len(), CATALOG.len());
        assert_eq!(report.test_user.unwrap().username, TEST_USERNAME);
        assert!(report.authenticated);

        let store = report.store.unwrap();
        assert_eq!(store.item_count, CATALOG.len());
        assert_eq!(store.purchase, Some(("Rainbow Bird".to_string(), true)));
        assert_eq!(
            setup.backend().purchases.borrow().as_slice(),
            &[("u1".to_string(), "1".to_string())]
        );
    }

    #[test]
    fn test_store_check_without_user_skips_purchase() {
        let backend = FakeBackend::default();
        backend.items.borrow_mut().push(item("9", "Shield"));
        let setup = DatabaseSetup::new(backend);
        let check = setup.test_store_operations(None).unwrap();
        assert_eq!(check.item_count, 1);
        assert_eq!(check.purchase, None);
    }

    #[test]
    fn test_status_reports_errors_as_text() {
        let setup = DatabaseSetup::new(FakeBackend {
            fail_items: true,
            ..FakeBackend::default()
        });
        let status = setup.show_status();
        assert!(status.store_items.is_err());
        assert_eq!(status.themes, Ok(0));
        assert!(status.current_user.is_none());
    }
}
