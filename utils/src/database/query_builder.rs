use postgres_from_row::FromRow;
use postgres_types::{FromSql, ToSql};
use tokio_postgres::{Client, Error, Row};

pub fn query<'a>(query: impl ToString) -> QueryBuilder<'a> {
	QueryBuilder::new(query)
}

/// Incrementally assembles a statement and its positional parameters.
///
/// [`QueryBuilder::push_bind`] appends the next `$n` placeholder to the SQL
/// text, [`QueryBuilder::bind`] only records a value for a placeholder that
/// was already written by hand.
#[derive(Default)]
pub struct QueryBuilder<'a> {
	query: String,
	params: Vec<Box<dyn ToSql + Send + Sync + 'a>>,
}

impl<'a> QueryBuilder<'a> {
	pub fn new(query: impl ToString) -> Self {
		Self {
			query: query.to_string(),
			params: Vec::new(),
		}
	}

	pub fn push(&mut self, sql: impl AsRef<str>) -> &mut Self {
		self.query.push_str(sql.as_ref());
		self
	}

	pub fn push_bind(&mut self, param: impl ToSql + Send + Sync + 'a) -> &mut Self {
		self.params.push(Box::new(param));
		self.query.push('$');
		self.query.push_str(&self.params.len().to_string());
		self
	}

	pub fn bind(&mut self, param: impl ToSql + Send + Sync + 'a) -> &mut Self {
		self.params.push(Box::new(param));
		self
	}

	pub fn sql(&self) -> &str {
		&self.query
	}

	pub fn param_count(&self) -> usize {
		self.params.len()
	}

	fn params(&self) -> Vec<&(dyn ToSql + Sync)> {
		self.params.iter().map(|param| param.as_ref() as &(dyn ToSql + Sync)).collect()
	}

	pub async fn fetch_rows(&self, client: &Client) -> Result<Vec<Row>, Error> {
		client.query(self.sql(), &self.params()).await
	}

	pub async fn fetch_all<T: FromRow>(&self, client: &Client) -> Result<Vec<T>, Error> {
		self.fetch_rows(client)
			.await?
			.iter()
			.map(T::try_from_row)
			.collect()
	}

	pub async fn fetch_optional<T: FromRow>(&self, client: &Client) -> Result<Option<T>, Error> {
		client
			.query_opt(self.sql(), &self.params())
			.await?
			.as_ref()
			.map(T::try_from_row)
			.transpose()
	}

	pub async fn fetch_one<T: FromRow>(&self, client: &Client) -> Result<T, Error> {
		T::try_from_row(&client.query_one(self.sql(), &self.params()).await?)
	}

	/// Reads the first column of a single row.
	pub async fn fetch_scalar<T: for<'r> FromSql<'r>>(&self, client: &Client) -> Result<T, Error> {
		client.query_one(self.sql(), &self.params()).await?.try_get(0)
	}

	pub async fn execute(&self, client: &Client) -> Result<u64, Error> {
		client.execute(self.sql(), &self.params()).await
	}
}
