//! In-memory provider used by the server integration tests.
//!
//! Every gateway call is recorded so tests can assert which remote calls a
//! lifecycle request made.

#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use time::{Duration, OffsetDateTime};

use dbbroker_core::instance::{InstanceLinks, Link};
use dbbroker_core::{
    Account, ConnectionStrings, CreatedInstance, Database, DynGateway, GatewayError, NewInstance,
    Operation, OperationStatus, RemoteGateway, ResolverDefaults, Scaling, ServiceCatalog,
    ServiceInstance,
};
use dbbroker_server::Reconciler;

pub const POSTGRES_SERVICE: &str = "9b4ee86b-3876-469f-a531-062e71bc5859";
pub const POSTGRES_SMALL: &str = "d6222855-17c6-448c-885a-e9d931cd221b";
pub const POSTGRES_LARGE: &str = "5c8bb3b2-4d6e-4a77-9e5e-0e3bb1c2b2b0";
pub const REDIS_SERVICE: &str = "e27ea95a-3883-44f2-8ca4-01101f39d50c";
pub const REDIS_DEFAULT: &str = "ae2bda53-fe15-4335-9422-774aae3e7e32";

pub const CATALOG: &str = r#"
services:
- id: 9b4ee86b-3876-469f-a531-062e71bc5859
  name: postgresql
  description: PostgreSQL database
  plans:
  - id: d6222855-17c6-448c-885a-e9d931cd221b
    name: small
    description: one unit
    metadata:
      units: 1
  - id: 5c8bb3b2-4d6e-4a77-9e5e-0e3bb1c2b2b0
    name: large
    description: four units
    metadata:
      units: 4
      datacenter: gce:europe-west1
- id: e27ea95a-3883-44f2-8ca4-01101f39d50c
  name: redis
  description: Redis key-value store
  plans:
  - id: ae2bda53-fe15-4335-9422-774aae3e7e32
    name: default
    description: single unit
    metadata:
      units: 0
"#;

pub fn catalog() -> ServiceCatalog {
    ServiceCatalog::from_yaml_str(CATALOG).expect("test catalog")
}

pub fn defaults() -> ResolverDefaults {
    ResolverDefaults {
        datacenter: "aws:eu-central-1".to_string(),
        account_id: None,
    }
}

pub fn reconciler(gateway: &Arc<FakeGateway>) -> Reconciler {
    let dyn_gateway: DynGateway = gateway.clone();
    Reconciler::new(dyn_gateway, Arc::new(catalog()), defaults())
}

/// A remote call as seen by the fake.
#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    ListInstances,
    GetInstance(String),
    CreateInstance(NewInstance),
    DeleteInstance(String),
    GetOperation(String),
    ListOperations(String),
    GetScaling(String),
    SetScaling(String, i64),
    ListAccounts,
    ListDatabases,
}

impl Call {
    pub fn is_mutation(&self) -> bool {
        matches!(
            self,
            Self::CreateInstance(_) | Self::DeleteInstance(_) | Self::SetScaling(..)
        )
    }
}

struct State {
    instances: Vec<ServiceInstance>,
    operations: HashMap<String, Vec<Operation>>,
    scalings: HashMap<String, Scaling>,
    accounts: Vec<Account>,
    databases: Vec<Database>,
    initial_status: OperationStatus,
    failing: HashSet<&'static str>,
    calls: Vec<Call>,
    clock: i64,
    next_id: u32,
}

pub struct FakeGateway {
    state: Mutex<State>,
}

impl Default for FakeGateway {
    fn default() -> Self {
        Self {
            state: Mutex::new(State {
                instances: Vec::new(),
                operations: HashMap::new(),
                scalings: HashMap::new(),
                accounts: vec![Account {
                    id: "acc-1".into(),
                    name: "Compose".into(),
                    slug: "compose".into(),
                }],
                databases: vec![
                    database("postgresql", "stable"),
                    database("redis", "beta"),
                ],
                initial_status: OperationStatus::Running,
                failing: HashSet::new(),
                calls: Vec::new(),
                clock: 0,
                next_id: 0,
            }),
        }
    }
}

fn database(database_type: &str, status: &str) -> Database {
    Database {
        database_type: database_type.into(),
        status: status.into(),
        ..Default::default()
    }
}

fn failure(call: &str) -> GatewayError {
    GatewayError::status(500, &format!(r#"{{"errors":"{call} is broken"}}"#))
}

fn not_found() -> GatewayError {
    GatewayError::status(404, r#"{"errors":"not found"}"#)
}

impl State {
    fn record(&mut self, name: &'static str, call: Call) -> Result<(), GatewayError> {
        self.calls.push(call);
        if self.failing.contains(name) {
            Err(failure(name))
        } else {
            Ok(())
        }
    }

    fn tick(&mut self) -> OffsetDateTime {
        self.clock += 1;
        OffsetDateTime::UNIX_EPOCH + Duration::days(17_000) + Duration::seconds(self.clock)
    }

    fn next_id(&mut self, prefix: &str) -> String {
        self.next_id += 1;
        format!("{prefix}-{}", self.next_id)
    }

    fn instance_id(&self, name: &str) -> Option<String> {
        self.instances
            .iter()
            .find(|i| i.name == name)
            .map(|i| i.id.clone())
    }

    fn push_operation(&mut self, instance_id: &str, name: &str, status: OperationStatus) -> String {
        let id = self.next_id("op");
        let now = self.tick();
        let operation = Operation {
            id: id.clone(),
            name: name.into(),
            template: "Recipes::Deployment::Run".into(),
            status,
            status_detail: String::new(),
            account_id: "acc-1".into(),
            deployment_id: instance_id.into(),
            parent_id: None,
            created_at: Some(now),
            updated_at: Some(now),
            operations_complete: 0,
            operations_total: 3,
        };
        self.operations
            .entry(instance_id.to_string())
            .or_default()
            .push(operation);
        id
    }

    fn new_instance(&mut self, name: &str, database_type: &str) -> ServiceInstance {
        let id = self.next_id("dep");
        let created_at = self.tick();
        ServiceInstance {
            id,
            account_id: "acc-1".into(),
            name: name.into(),
            database_type: database_type.into(),
            version: "9.6.3".into(),
            created_at: Some(created_at),
            connection_strings: ConnectionStrings {
                direct: vec![format!(
                    "postgres://admin:secret@{name}.db.example.test:10000/compose"
                )],
                ..Default::default()
            },
            links: InstanceLinks {
                web_ui: Link {
                    href: format!("https://app.example.test/deployments/{name}{{?embed}}"),
                    templated: true,
                },
            },
            ..Default::default()
        }
    }
}

fn scaling(units: i64) -> Scaling {
    Scaling {
        allocated_units: units,
        used_units: units.min(1),
        starting_units: 1,
        minimum_units: 1,
        unit_type: "memory".into(),
        ..Default::default()
    }
}

impl FakeGateway {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    fn state(&self) -> MutexGuard<'_, State> {
        self.state.lock().expect("fake gateway state")
    }

    /// Add an existing instance with the given allocation and no job history.
    pub fn with_instance(&self, name: &str, units: i64) -> String {
        let mut state = self.state();
        let instance = state.new_instance(name, "postgresql");
        let id = instance.id.clone();
        state.scalings.insert(id.clone(), scaling(units));
        state.instances.push(instance);
        id
    }

    /// Replace the direct connection strings of an instance.
    pub fn set_direct(&self, name: &str, direct: &[&str]) {
        let mut state = self.state();
        if let Some(instance) = state.instances.iter_mut().find(|i| i.name == name) {
            instance.connection_strings.direct = direct.iter().map(|s| s.to_string()).collect();
        }
    }

    /// Record a job for the instance, newer than every job before it.
    pub fn add_operation(&self, name: &str, operation: &str, status: OperationStatus) -> String {
        let mut state = self.state();
        let instance_id = state.instance_id(name).expect("instance exists");
        state.push_operation(&instance_id, operation, status)
    }

    /// Status of jobs started by create, delete and set scaling.
    pub fn initial_status(&self, status: OperationStatus) {
        self.state().initial_status = status;
    }

    /// Make every call of the given kind fail with a provider error.
    pub fn fail_on(&self, call: &'static str) {
        self.state().failing.insert(call);
    }

    pub fn remove_scaling(&self, name: &str) {
        let mut state = self.state();
        if let Some(id) = state.instance_id(name) {
            state.scalings.remove(&id);
        }
    }

    /// Complete every job of the instance.
    pub fn settle(&self, name: &str) {
        let mut state = self.state();
        let Some(id) = state.instance_id(name) else {
            return;
        };
        for operation in state.operations.entry(id).or_default() {
            operation.status = OperationStatus::Complete;
        }
    }

    pub fn remove_instance(&self, name: &str) {
        self.state().instances.retain(|i| i.name != name);
    }

    pub fn instance_count(&self) -> usize {
        self.state().instances.len()
    }

    pub fn allocated_units(&self, name: &str) -> Option<i64> {
        let state = self.state();
        let id = state.instance_id(name)?;
        state.scalings.get(&id).map(|s| s.allocated_units)
    }

    pub fn calls(&self) -> Vec<Call> {
        self.state().calls.clone()
    }

    pub fn mutations(&self) -> Vec<Call> {
        self.calls().into_iter().filter(Call::is_mutation).collect()
    }

    pub fn clear_calls(&self) {
        self.state().calls.clear();
    }
}

#[async_trait]
impl RemoteGateway for FakeGateway {
    async fn list_instances(&self) -> Result<Vec<ServiceInstance>, GatewayError> {
        let mut state = self.state();
        state.record("list_instances", Call::ListInstances)?;
        // The listing only carries summary fields.
        Ok(state
            .instances
            .iter()
            .map(|i| ServiceInstance {
                id: i.id.clone(),
                name: i.name.clone(),
                database_type: i.database_type.clone(),
                ..Default::default()
            })
            .collect())
    }

    async fn get_instance(&self, instance_id: &str) -> Result<ServiceInstance, GatewayError> {
        let mut state = self.state();
        state.record("get_instance", Call::GetInstance(instance_id.into()))?;
        state
            .instances
            .iter()
            .find(|i| i.id == instance_id)
            .cloned()
            .ok_or_else(not_found)
    }

    async fn create_instance(&self, params: &NewInstance) -> Result<CreatedInstance, GatewayError> {
        let mut state = self.state();
        state.record("create_instance", Call::CreateInstance(params.clone()))?;
        let mut instance = state.new_instance(&params.name, &params.database_type);
        instance.account_id = params.account_id.clone();
        instance.notes = params.notes.clone();
        let status = state.initial_status;
        let operation_id = state.push_operation(&instance.id, "Provision", status);
        instance.provision_recipe_id = Some(operation_id.clone());
        state
            .scalings
            .insert(instance.id.clone(), scaling(params.units));
        state.instances.push(instance.clone());
        Ok(CreatedInstance {
            instance,
            operation_id: Some(operation_id),
        })
    }

    async fn delete_instance(&self, instance_id: &str) -> Result<Option<String>, GatewayError> {
        let mut state = self.state();
        state.record("delete_instance", Call::DeleteInstance(instance_id.into()))?;
        let status = state.initial_status;
        let operation_id = state.push_operation(instance_id, "Deprovision", status);
        if status == OperationStatus::Complete {
            state.instances.retain(|i| i.id != instance_id);
        }
        Ok(Some(operation_id))
    }

    async fn get_operation(&self, operation_id: &str) -> Result<Operation, GatewayError> {
        let mut state = self.state();
        state.record("get_operation", Call::GetOperation(operation_id.into()))?;
        state
            .operations
            .values()
            .flatten()
            .find(|op| op.id == operation_id)
            .cloned()
            .ok_or_else(not_found)
    }

    async fn list_operations(&self, instance_id: &str) -> Result<Vec<Operation>, GatewayError> {
        let mut state = self.state();
        state.record("list_operations", Call::ListOperations(instance_id.into()))?;
        // Oldest first, like the provider.
        Ok(state.operations.get(instance_id).cloned().unwrap_or_default())
    }

    async fn get_scaling(&self, instance_id: &str) -> Result<Scaling, GatewayError> {
        let mut state = self.state();
        state.record("get_scaling", Call::GetScaling(instance_id.into()))?;
        state.scalings.get(instance_id).cloned().ok_or_else(not_found)
    }

    async fn set_scaling(
        &self,
        instance_id: &str,
        units: i64,
    ) -> Result<Option<String>, GatewayError> {
        let mut state = self.state();
        state.record("set_scaling", Call::SetScaling(instance_id.into(), units))?;
        let status = state.initial_status;
        let operation_id = state.push_operation(instance_id, "Scale", status);
        if status == OperationStatus::Complete {
            state.scalings.insert(instance_id.to_string(), scaling(units));
        }
        Ok(Some(operation_id))
    }

    async fn list_accounts(&self) -> Result<Vec<Account>, GatewayError> {
        let mut state = self.state();
        state.record("list_accounts", Call::ListAccounts)?;
        Ok(state.accounts.clone())
    }

    async fn list_databases(&self) -> Result<Vec<Database>, GatewayError> {
        let mut state = self.state();
        state.record("list_databases", Call::ListDatabases)?;
        Ok(state.databases.clone())
    }
}
