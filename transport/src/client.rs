use housecall_compiler::{raw, Grammar, InsertValues, QueryModel};
use serde_json::{Map, Value as JsonValue};
use tracing::debug;

use crate::{
    auth::Credentials,
    bind::bind,
    config::{ClientConfig, ConnectionConfig, Driver},
    errors::{Error, Result},
    statement::Statement,
    transport::HttpTransport,
};

/// One decoded result row.
pub type Record = Map<String, JsonValue>;

const EXISTS_FIELD: &str = "exists";
const AGGREGATE_FIELD: &str = "aggregate";

/// Compiles query models and runs them over a transport.
#[derive(Debug)]
pub struct Client {
    grammar: Grammar,
    transport: HttpTransport,
}

impl Client {
    /// Open the config's default connection.
    pub fn connect(config: &ClientConfig) -> Result<Self> {
        Self::connect_with(config.default_connection()?)
    }

    pub fn connect_named(config: &ClientConfig, name: &str) -> Result<Self> {
        Self::connect_with(config.connection(name)?)
    }

    pub fn connect_with(connection: &ConnectionConfig) -> Result<Self> {
        let transport = match connection.driver()? {
            Driver::Http => {
                let credentials =
                    Credentials::new(&connection.username, connection.password.clone());
                let mut transport =
                    HttpTransport::new(&connection.host, connection.port, credentials);
                transport.settings_mut().database(&connection.database);
                transport
            }
        };
        debug!(host = %connection.host, port = connection.port, "connected");
        Ok(Self::from_transport(transport))
    }

    pub fn from_transport(transport: HttpTransport) -> Self {
        Self {
            grammar: Grammar::default(),
            transport,
        }
    }

    pub fn with_grammar(mut self, grammar: Grammar) -> Self {
        self.grammar = grammar;
        self
    }

    pub fn grammar(&self) -> &Grammar {
        &self.grammar
    }

    pub fn transport(&self) -> &HttpTransport {
        &self.transport
    }

    pub fn transport_mut(&mut self) -> &mut HttpTransport {
        &mut self.transport
    }

    pub fn into_transport(self) -> HttpTransport {
        self.transport
    }

    /// Start a query on `table`.
    pub fn table(&self, table: &str) -> QueryModel {
        QueryModel::table(table)
    }

    /// The statement exactly as it would be sent, bindings included.
    pub fn to_sql(&self, query: &QueryModel) -> Result<String> {
        let sql = self.grammar.compile_select(query);
        bind(&sql, &query.bindings(), self.grammar.options().dialect.as_ref())
    }

    async fn select(&self, sql: &str, query: &QueryModel) -> Result<Statement> {
        let statement = self
            .transport
            .select(sql, &query.bindings(), None, None)
            .await?;
        statement.error()?;
        Ok(statement)
    }

    pub async fn get(&self, query: &QueryModel) -> Result<Vec<Record>> {
        let sql = self.grammar.compile_select(query);
        self.select(&sql, query).await?.rows()
    }

    pub async fn first(&self, query: &QueryModel) -> Result<Option<Record>> {
        let query = query.clone().limit(1);
        Ok(self.get(&query).await?.into_iter().next())
    }

    pub async fn exists(&self, query: &QueryModel) -> Result<bool> {
        let sql = self.grammar.compile_exists(query);
        let rows = self.select(&sql, query).await?.rows()?;
        let value = single_field(rows, EXISTS_FIELD)?;
        match value {
            JsonValue::Bool(b) => Ok(b),
            JsonValue::Number(n) => Ok(n.as_u64() == Some(1)),
            JsonValue::String(s) => Ok(s == "1"),
            other => Err(Error::Response(format!("unexpected exists value {other}"))),
        }
    }

    pub async fn count(&self, query: &QueryModel) -> Result<u64> {
        let query = query.clone().aggregate("count", [raw("*")]);
        let rows = self.get(&query).await?;
        let value = single_field(rows, AGGREGATE_FIELD)?;
        // 64-bit integers come back quoted by default.
        let count = match &value {
            JsonValue::Number(n) => n.as_u64(),
            JsonValue::String(s) => s.parse().ok(),
            _ => None,
        };
        count.ok_or_else(|| Error::Response(format!("unexpected count value {value}")))
    }

    pub async fn insert(
        &self,
        query: &QueryModel,
        values: impl Into<InsertValues>,
    ) -> Result<Statement> {
        let values = values.into();
        let sql = self.grammar.compile_insert(query, &values)?;
        self.transport.write(&sql, &values.bindings()?, true).await
    }
}

fn single_field(rows: Vec<Record>, field: &str) -> Result<JsonValue> {
    rows.into_iter()
        .next()
        .and_then(|mut row| row.remove(field))
        .ok_or_else(|| Error::Response(format!("result has no `{field}` column")))
}
