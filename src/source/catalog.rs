//! Caching access to the typed tables of a `Source`.

use crate::error::Res;
use crate::model::{DetailTable, FundAllocationTable, MunicipalityProfile};
use crate::source::{
    classes_path, fund_path, iv3_path, ClassTable, Document, FundTable, Iv3Table, Source,
};
use anyhow::Context;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, trace};

/// Fetched tables are kept for the lifetime of the catalog. The per-municipality extracts taken
/// from them are kept for one generation; `invalidate` starts a new one.
pub struct Catalog {
    source: Box<dyn Source>,
    iv3: HashMap<(i32, Document), Arc<Iv3Table>>,
    fund: HashMap<String, Arc<FundTable>>,
    classes: HashMap<i32, Arc<ClassTable>>,
    generation: u64,
    details: HashMap<(i32, Document, String), (MunicipalityProfile, DetailTable)>,
    allocations: HashMap<(String, String), FundAllocationTable>,
}

impl Catalog {
    pub fn new(source: Box<dyn Source>) -> Self {
        Self {
            source,
            iv3: HashMap::new(),
            fund: HashMap::new(),
            classes: HashMap::new(),
            generation: 0,
            details: HashMap::new(),
            allocations: HashMap::new(),
        }
    }

    pub fn source(&self) -> &dyn Source {
        self.source.as_ref()
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Drops the per-municipality extracts. Fetched tables are kept.
    pub fn invalidate(&mut self) {
        self.details.clear();
        self.allocations.clear();
        self.generation += 1;
        debug!("Started filter generation {}", self.generation);
    }

    pub async fn iv3(&mut self, year: i32, document: Document) -> Res<Arc<Iv3Table>> {
        if let Some(table) = self.iv3.get(&(year, document)) {
            trace!("Iv3 table {year} {document} is cached");
            return Ok(table.clone());
        }
        let path = iv3_path(year, document);
        let text = self
            .source
            .fetch(&path)
            .await
            .with_context(|| format!("Unable to fetch the Iv3 table {year} {document}"))?;
        let table = Arc::new(
            Iv3Table::parse(&text).with_context(|| format!("Unable to parse {path}"))?,
        );
        self.iv3.insert((year, document), table.clone());
        Ok(table)
    }

    /// `path` is the fund path of a circular option, e.g. `S2024_2025`.
    pub async fn fund(&mut self, path: &str) -> Res<Arc<FundTable>> {
        if let Some(table) = self.fund.get(path) {
            trace!("Fund table {path} is cached");
            return Ok(table.clone());
        }
        let file = fund_path(path);
        let text = self
            .source
            .fetch(&file)
            .await
            .with_context(|| format!("Unable to fetch the fund table for {path}"))?;
        let table = Arc::new(
            FundTable::parse(path, &text).with_context(|| format!("Unable to parse {file}"))?,
        );
        self.fund.insert(path.to_string(), table.clone());
        Ok(table)
    }

    pub async fn classes(&mut self, year: i32) -> Res<Arc<ClassTable>> {
        if let Some(table) = self.classes.get(&year) {
            return Ok(table.clone());
        }
        let path = classes_path(year);
        let text = self
            .source
            .fetch(&path)
            .await
            .with_context(|| format!("Unable to fetch the municipality classes of {year}"))?;
        let table =
            Arc::new(ClassTable::parse(&text).with_context(|| format!("Unable to parse {path}"))?);
        self.classes.insert(year, table.clone());
        Ok(table)
    }

    /// The profile and detail table of one municipality.
    pub async fn detail(
        &mut self,
        year: i32,
        document: Document,
        municipality: &str,
    ) -> Res<(MunicipalityProfile, DetailTable)> {
        let key = (year, document, municipality.to_string());
        if let Some(found) = self.details.get(&key) {
            trace!("Detail of {municipality} is cached");
            return Ok(found.clone());
        }
        let table = self.iv3(year, document).await?;
        let found = table.detail(municipality)?;
        self.details.insert(key, found.clone());
        Ok(found)
    }

    /// The fund allocation of one municipality for the circular with fund path `path`.
    pub async fn allocation(&mut self, path: &str, municipality: &str) -> Res<FundAllocationTable> {
        let key = (path.to_string(), municipality.to_string());
        if let Some(found) = self.allocations.get(&key) {
            trace!("Allocation of {municipality} is cached");
            return Ok(found.clone());
        }
        let table = self.fund(path).await?;
        let found = table.allocation(municipality)?;
        self.allocations.insert(key, found.clone());
        Ok(found)
    }

    /// The number of residents of `municipality`: from the Iv3 table when it carries it, otherwise
    /// from the class table of the year.
    pub async fn residents(
        &mut self,
        year: i32,
        document: Document,
        municipality: &str,
    ) -> Res<u64> {
        let (profile, _) = self.detail(year, document, municipality).await?;
        if let Some(residents) = profile.residents {
            return Ok(residents);
        }
        debug!("Looking up the residents of {municipality} in the class table");
        self.classes(year).await?.residents(municipality)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::MemorySource;
    use crate::test::{fixture_source, FIXTURE_YEAR, FUND_PATH};

    /// A source that shares its fetch counter with the test.
    struct Shared(Arc<MemorySource>);

    #[async_trait::async_trait]
    impl Source for Shared {
        async fn fetch(&self, path: &str) -> Res<String> {
            self.0.fetch(path).await
        }

        fn describe(&self) -> String {
            self.0.describe()
        }
    }

    #[tokio::test]
    async fn test_tables_are_fetched_once() {
        let source = Arc::new(fixture_source());
        let mut catalog = Catalog::new(Box::new(Shared(source.clone())));
        catalog.iv3(FIXTURE_YEAR, Document::Begroting).await.unwrap();
        catalog.iv3(FIXTURE_YEAR, Document::Begroting).await.unwrap();
        catalog.fund(FUND_PATH).await.unwrap();
        catalog.fund(FUND_PATH).await.unwrap();
        assert_eq!(source.fetches(), 2);
    }

    #[tokio::test]
    async fn test_invalidate_keeps_tables() {
        let source = Arc::new(fixture_source());
        let mut catalog = Catalog::new(Box::new(Shared(source.clone())));
        let (_, a) = catalog
            .detail(FIXTURE_YEAR, Document::Begroting, "Utrecht")
            .await
            .unwrap();
        catalog.invalidate();
        assert_eq!(catalog.generation(), 1);
        let (_, b) = catalog
            .detail(FIXTURE_YEAR, Document::Begroting, "Utrecht")
            .await
            .unwrap();
        assert_eq!(a, b);
        assert_eq!(source.fetches(), 1);
    }

    #[tokio::test]
    async fn test_allocation_and_residents() {
        let mut catalog = Catalog::new(Box::new(fixture_source()));
        let fund = catalog.allocation(FUND_PATH, "Utrecht").await.unwrap();
        assert_eq!(fund.municipality(), "Utrecht");
        let residents = catalog
            .residents(FIXTURE_YEAR, Document::Begroting, "Utrecht")
            .await
            .unwrap();
        assert_eq!(residents, 10_000);
    }

    #[tokio::test]
    async fn test_residents_from_class_table() {
        let mut catalog = Catalog::new(Box::new(fixture_source()));
        let residents = catalog
            .residents(FIXTURE_YEAR, Document::Begroting, "Zeist")
            .await
            .unwrap();
        assert_eq!(residents, 65_000);
    }

    #[tokio::test]
    async fn test_missing_table() {
        let mut catalog = Catalog::new(Box::new(fixture_source()));
        let err = catalog.iv3(1999, Document::Jaarrekening).await.unwrap_err();
        assert!(format!("{err:#}").contains("1999"));
    }
}
