//! Headless entity screen: scope selection, table state, privilege-gated
//! actions and user notifications around one `EntityService`.
//!
//! Screen operations never return errors. Failures become error
//! notifications, which is how the UI surfaces them.

use std::{collections::HashSet, sync::Arc};

use models::entity::{Action, EntityDescriptor};
use tracing::warn;
use utils::tokenize::Record;

use super::{
    entity::{
        DeletePolicy, DeleteReport, EntityError, EntityService, RowOutcome, RowResult,
        SaveOutcome, Scope,
    },
    export::{Delivery, DownloadSink},
    notification::{Notification, Notifier},
    privilege::PrivilegeCheck,
    table::{self, TablePage, TableState},
};

/// Which actions the current user may see.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Affordances {
    pub create: bool,
    pub update: bool,
    pub delete: bool,
    pub export: bool,
}

pub struct EntityScreen {
    service: EntityService,
    privileges: Arc<dyn PrivilegeCheck>,
    notifier: Arc<dyn Notifier>,
    scope: Scope,
    rows: Vec<Record>,
    table: TableState,
}

impl EntityScreen {
    pub fn new(
        service: EntityService,
        privileges: Arc<dyn PrivilegeCheck>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            service,
            privileges,
            notifier,
            scope: Scope::default(),
            rows: Vec::new(),
            table: TableState::default(),
        }
    }

    pub fn descriptor(&self) -> &EntityDescriptor {
        self.service.descriptor()
    }

    pub fn scope(&self) -> &Scope {
        &self.scope
    }

    pub fn rows(&self) -> &[Record] {
        &self.rows
    }

    /// Changing company invalidates the farm and the loaded rows.
    pub fn select_company(&mut self, company_id: Option<String>) {
        if self.scope.company_id != company_id {
            self.scope.company_id = company_id;
            self.scope.farm_id = None;
            self.rows.clear();
            self.table.page = 0;
        }
    }

    pub fn select_farm(&mut self, farm_id: Option<String>) -> Result<(), EntityError> {
        if farm_id.is_some() && self.scope.company_id.is_none() {
            return Err(EntityError::ScopeIncomplete("company"));
        }
        if self.scope.farm_id != farm_id {
            self.scope.farm_id = farm_id;
            self.rows.clear();
            self.table.page = 0;
        }
        Ok(())
    }

    pub fn is_allowed(&self, action: Action) -> bool {
        let descriptor = self.descriptor();
        descriptor.operation(action).is_some()
            && descriptor
                .privileges
                .get(action)
                .is_none_or(|p| self.privileges.is_granted(p))
    }

    pub fn affordances(&self) -> Affordances {
        Affordances {
            create: self.is_allowed(Action::Create),
            update: self.is_allowed(Action::Update),
            delete: self.is_allowed(Action::Delete),
            export: self.is_allowed(Action::Export),
        }
    }

    fn check(&self, action: Action) -> Result<(), EntityError> {
        let descriptor = self.descriptor();
        if descriptor.operation(action).is_none() {
            return Err(EntityError::Unsupported {
                entity: descriptor.name.clone(),
                action,
            });
        }
        if !self.is_allowed(action) {
            return Err(EntityError::Forbidden {
                entity: descriptor.name.clone(),
                action,
            });
        }
        Ok(())
    }

    fn notify_error(&self, err: &EntityError) {
        self.notifier
            .notify(Notification::error(self.descriptor().label.clone(), err.to_string()));
    }

    /// Reload rows. On failure the table is left empty. An empty result is
    /// reported as an info notification.
    pub async fn refresh(&mut self) -> bool {
        match self.service.list(&self.scope).await {
            Ok(rows) => {
                self.rows = rows;
                if self.rows.is_empty() {
                    let label = self.descriptor().label.clone();
                    self.notifier
                        .notify(Notification::info(label.clone(), format!("no {label} rows")));
                }
                true
            }
            Err(e) => {
                self.rows.clear();
                self.notify_error(&e);
                false
            }
        }
    }

    pub fn table(&self) -> &TableState {
        &self.table
    }

    pub fn set_filter(&mut self, filter: impl Into<String>) {
        self.table.filter = filter.into();
        self.table.page = 0;
    }

    pub fn set_page(&mut self, page: usize) {
        self.table.page = page;
    }

    pub fn set_page_size(&mut self, page_size: usize) {
        self.table.page_size = page_size;
        self.table.page = 0;
    }

    pub fn page(&self) -> TablePage<'_> {
        let columns = self.descriptor().column_fields(self.rows.first());
        table::render(&self.rows, &columns, &self.table)
    }

    /// Save the form, then refetch. Returns whether the save succeeded.
    pub async fn submit(&mut self, form: Record) -> bool {
        let action = match self.descriptor().identifier(&form) {
            Some(_) => Action::Update,
            None => Action::Create,
        };
        let result = match self.check(action) {
            Ok(()) => self.service.save(&form, &self.scope).await,
            Err(e) => Err(e),
        };

        match result {
            Ok(outcome) => {
                let verb = match outcome {
                    SaveOutcome::Created(_) => "created",
                    SaveOutcome::Updated(_) => "updated",
                };
                let label = self.descriptor().label.clone();
                self.notifier
                    .notify(Notification::success(label.clone(), format!("{label} {verb}")));
                self.refresh().await;
                true
            }
            Err(e) => {
                self.notify_error(&e);
                false
            }
        }
    }

    /// Delete the loaded rows whose identifiers are in `ids`, in table order.
    /// Requested identifiers with no loaded row are reported as failed.
    pub async fn delete_selected(
        &mut self,
        ids: &[String],
        policy: DeletePolicy,
    ) -> Option<DeleteReport> {
        if let Err(e) = self.check(Action::Delete) {
            self.notify_error(&e);
            return None;
        }

        let wanted: HashSet<&str> = ids.iter().map(String::as_str).collect();
        let descriptor = self.descriptor();
        let selected: Vec<Record> = self
            .rows
            .iter()
            .filter(|row| {
                descriptor
                    .identifier(row)
                    .is_some_and(|id| wanted.contains(id.as_str()))
            })
            .cloned()
            .collect();
        let loaded: HashSet<String> = selected
            .iter()
            .filter_map(|row| descriptor.identifier(row))
            .collect();
        let mut missing: Vec<String> = Vec::new();
        for id in ids {
            if !loaded.contains(id) && !missing.contains(id) {
                missing.push(id.clone());
            }
        }
        if !missing.is_empty() {
            warn!(
                entity = %descriptor.name,
                missing = ?missing,
                "some selected rows are not loaded"
            );
        }

        let mut report = match self.service.delete_batch(&selected, policy).await {
            Ok(report) => report,
            Err(e) => {
                self.notify_error(&e);
                return None;
            }
        };
        report.rows.extend(missing.into_iter().map(|id| RowResult {
            id: Some(id),
            outcome: RowOutcome::Failed("row is not loaded".to_string()),
        }));

        let label = self.descriptor().label.clone();
        if report.is_complete() {
            self.notifier.notify(Notification::success(
                label,
                format!("{} row(s) deleted", report.deleted()),
            ));
        } else {
            self.notifier.notify(Notification::error(
                label,
                format!(
                    "deleted {} of {} row(s): {}",
                    report.deleted(),
                    report.rows.len(),
                    report.first_failure().unwrap_or("unknown error")
                ),
            ));
        }
        self.refresh().await;
        Some(report)
    }

    /// Export the current scope and hand the file to `sink` once.
    pub async fn export(&mut self, sink: &dyn DownloadSink) -> Option<Delivery> {
        let result = async {
            self.check(Action::Export)?;
            let artifact = self.service.export(&self.scope).await?;
            Ok::<_, EntityError>(sink.deliver(artifact).await?)
        }
        .await;

        match result {
            Ok(delivery) => {
                self.notifier.notify(Notification::success(
                    self.descriptor().label.clone(),
                    format!("exported to {}", delivery.path.display()),
                ));
                Some(delivery)
            }
            Err(e) => {
                self.notify_error(&e);
                None
            }
        }
    }

    /// Whether this screen still needs a company/farm before it can load.
    pub fn missing_scope(&self) -> Option<&'static str> {
        match self.scope.require(self.descriptor().scope) {
            Err(EntityError::ScopeIncomplete(what)) => Some(what),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use async_trait::async_trait;
    use models::EntityKind;
    use secrecy::SecretString;
    use serde_json::{Value, json};
    use utils::tokenize::TokenCodec;

    use super::*;
    use crate::services::{
        graphql::{GraphqlError, GraphqlRequest, GraphqlTransport},
        notification::{NotificationLevel, RecordingNotifier},
        privilege::{AllowAll, StaticPrivileges},
    };

    #[derive(Default)]
    struct CountingTransport {
        calls: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl GraphqlTransport for CountingTransport {
        async fn execute(&self, request: &GraphqlRequest) -> Result<Value, GraphqlError> {
            self.calls.lock().unwrap().push(request.operation_name.clone());
            Ok(json!({}))
        }
    }

    fn build_screen(
        kind: EntityKind,
        privileges: Arc<dyn PrivilegeCheck>,
    ) -> (EntityScreen, Arc<CountingTransport>, RecordingNotifier) {
        let transport = Arc::new(CountingTransport::default());
        let codec = TokenCodec::new(&SecretString::from("k".to_string()));
        let service = EntityService::new(transport.clone(), codec, kind.descriptor());
        let notifier = RecordingNotifier::default();
        let screen = EntityScreen::new(service, privileges, Arc::new(notifier.clone()));
        (screen, transport, notifier)
    }

    fn form(value: Value) -> Record {
        match value {
            Value::Object(map) => map,
            _ => unreachable!(),
        }
    }

    #[tokio::test]
    async fn test_forbidden_submit_sends_nothing() {
        let privileges = Arc::new(StaticPrivileges::from_csv("category:update"));
        let (mut screen, transport, notifier) = build_screen(EntityKind::Category, privileges);

        assert!(!screen.submit(form(json!({ "name": "Wetland" }))).await);
        assert!(transport.calls.lock().unwrap().is_empty());
        let errors = notifier.errors();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].message, "not allowed to create category");
    }

    #[tokio::test]
    async fn test_affordances_follow_privileges_and_operations() {
        let privileges = Arc::new(StaticPrivileges::from_csv("category:create,category:export"));
        let (screen, _, _) = build_screen(EntityKind::Category, privileges);
        assert_eq!(
            screen.affordances(),
            Affordances {
                create: true,
                update: false,
                delete: false,
                export: true,
            }
        );

        let (company, _, _) = screen_allow_all(EntityKind::Company);
        assert_eq!(company.affordances(), Affordances::default());
    }

    fn screen_allow_all(
        kind: EntityKind,
    ) -> (EntityScreen, Arc<CountingTransport>, RecordingNotifier) {
        build_screen(kind, Arc::new(AllowAll))
    }

    #[tokio::test]
    async fn test_scope_selection_and_refresh_gate() {
        let (mut screen, transport, notifier) = screen_allow_all(EntityKind::RuminantPen);
        assert_eq!(screen.missing_scope(), Some("company"));
        assert!(screen.select_farm(Some("f1".into())).is_err());

        assert!(!screen.refresh().await);
        assert_eq!(notifier.errors()[0].message, "select a company first");

        screen.select_company(Some("c1".into()));
        screen.select_farm(Some("f1".into())).unwrap();
        assert_eq!(screen.missing_scope(), None);
        assert!(screen.refresh().await);
        assert_eq!(
            *transport.calls.lock().unwrap(),
            vec!["TokenizedAllRuminantPens".to_string()]
        );

        screen.select_company(Some("c2".into()));
        assert_eq!(screen.scope().farm_id, None);
    }

    #[tokio::test]
    async fn test_successful_submit_notifies_and_refetches() {
        let (mut screen, transport, notifier) = screen_allow_all(EntityKind::Season);
        assert!(screen.submit(form(json!({ "id": "s1", "name": "Dry" }))).await);
        assert_eq!(
            *transport.calls.lock().unwrap(),
            vec!["UpdateSeason".to_string(), "TokenizedAllSeasons".to_string()]
        );
        let notifications = notifier.notifications();
        assert_eq!(notifications[0].level, NotificationLevel::Success);
        assert_eq!(notifications[0].message, "Season updated");
        // the refetch came back empty
        assert_eq!(notifications[1].level, NotificationLevel::Info);
        assert_eq!(notifications[1].message, "no Season rows");
    }
}
