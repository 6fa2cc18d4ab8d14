use std::{ops::Deref, sync::Arc};

use tokio_postgres::{Client, NoTls};

use crate::config::DatabaseConfig;

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS users (
	uid varchar(255) PRIMARY KEY,
	name varchar(255) NOT NULL,
	email varchar(255) NOT NULL UNIQUE,
	profile_image text,
	password_hash text NOT NULL
);
CREATE TABLE IF NOT EXISTS listings (
	id varchar(64) PRIMARY KEY,
	title varchar(70) NOT NULL,
	description text NOT NULL,
	price double precision NOT NULL,
	category varchar(32) NOT NULL,
	images text[] NOT NULL,
	owner varchar(255) NOT NULL,
	created_at timestamptz NOT NULL,
	is_boosted boolean NOT NULL DEFAULT false,
	boosted_until timestamptz,
	year integer,
	km_driven bigint,
	fuel_type varchar(32),
	transmission varchar(32),
	property_type varchar(32),
	bedrooms integer,
	bathrooms integer,
	furnished varchar(32),
	area bigint
);
CREATE INDEX IF NOT EXISTS listings_created_at_idx ON listings (created_at DESC);
CREATE INDEX IF NOT EXISTS listings_owner_idx ON listings (owner);
";

#[derive(Clone)]
pub struct DbClient(Arc<Client>);

impl Deref for DbClient {
	type Target = Client;

	fn deref(&self) -> &Self::Target {
		&self.0
	}
}

impl DbClient {
	pub async fn migrate(&self) -> Result<(), tokio_postgres::Error> {
		self.batch_execute(SCHEMA).await
	}
}

pub async fn db_client(config: &DatabaseConfig) -> Result<DbClient, tokio_postgres::Error> {
	let config_string = format!(
		"host={} user={} password={} dbname={}",
		config.host, config.user, config.password, config.dbname
	);
	let (client, monitor) = tokio_postgres::connect(config_string.as_str(), NoTls).await?;

	tokio::spawn(async move {
		if let Err(e) = monitor.await {
			log::error!("Connection error: {}", e);
		}
	});

	Ok(DbClient(Arc::new(client)))
}
