// `CollectionSource` over the HTTP proxy client.

use shoremap_api::{ProxyClient, RawRecord};

use super::CollectionSource;
use crate::error::CoreError;
use crate::model::{DetailRecord, WeatherSnapshot};

impl From<RawRecord> for DetailRecord {
    fn from(raw: RawRecord) -> Self {
        DetailRecord::new(raw.id, raw.fields)
    }
}

impl CollectionSource for ProxyClient {
    async fn beaches(&self) -> Result<Vec<DetailRecord>, CoreError> {
        let records = self.list_beaches().await?;
        Ok(records.into_iter().map(DetailRecord::from).collect())
    }

    async fn pois(&self) -> Result<Vec<DetailRecord>, CoreError> {
        let records = self.list_pois().await?;
        Ok(records.into_iter().map(DetailRecord::from).collect())
    }

    async fn weather(&self, id: &str) -> Result<WeatherSnapshot, CoreError> {
        Ok(WeatherSnapshot(self.get_weather(id).await?))
    }
}
