//! Read-only commands that list what can be selected for an analysis.

use crate::args::{CirculairesArgs, CompareArgs, MunicipalitiesArgs};
use crate::commands::{resolve_year, Out};
use crate::error::{Error, ErrorType, IntoResult};
use crate::pipeline::{select_comparisons, ComparisonFilter};
use crate::report::markdown;
use crate::source::{available_circulaires, Catalog, CirculaireOption, Document};
use crate::{Config, Result};
use anyhow::anyhow;
use tracing::debug;

/// Lists the municipalities of the Iv3 table of the selected year and document, sorted by name.
pub async fn municipalities(config: Config, args: MunicipalitiesArgs) -> Result<Out<Vec<String>>> {
    let year = resolve_year(&config, args.year().year(), args.year().document())?;
    let mut catalog = Catalog::new(config.source().pub_result(ErrorType::Config)?);
    let table = catalog
        .iv3(year, args.year().document())
        .await
        .pub_result(ErrorType::Source)?;
    let mut names: Vec<String> = table.municipalities().map(String::from).collect();
    names.sort();
    debug!("Found {} municipalities for {year}", names.len());
    Ok(Out::new(names.join("\n"), names))
}

/// Lists the circulars that can be selected for a budget year.
pub async fn circulaires(
    config: Config,
    args: CirculairesArgs,
) -> Result<Out<Vec<CirculaireOption>>> {
    let year = resolve_year(&config, args.year(), Document::Begroting)?;
    let options = available_circulaires(year, config.latest_circulaire());
    if options.is_empty() {
        return Err(Error::new(
            ErrorType::Input,
            anyhow!(
                "No circular applies to {year}, the latest circular is {}",
                config.latest_circulaire()
            ),
        ));
    }
    let rows: Vec<Vec<String>> = options
        .iter()
        .map(|o| vec![o.label.clone(), o.path.clone()])
        .collect();
    Ok(Out::new(markdown(&["Circulaire", "Pad"], &rows), options))
}

/// Lists the municipalities that can be compared with the selected one under the filter.
pub async fn compare(config: Config, args: CompareArgs) -> Result<Out<Vec<String>>> {
    let year = resolve_year(&config, args.year().year(), args.year().document())?;
    let mut catalog = Catalog::new(config.source().pub_result(ErrorType::Config)?);
    let table = catalog
        .iv3(year, args.year().document())
        .await
        .pub_result(ErrorType::Source)?;
    let reference = table.profile(args.municipality()).ok_or_else(|| {
        Error::new(
            ErrorType::Input,
            anyhow!(
                "The municipality '{}' is not in the Iv3 table of {year}",
                args.municipality()
            ),
        )
    })?;
    let filter = ComparisonFilter {
        same_structure: args.filter().same_structure(),
        same_centrum: args.filter().same_centrum(),
    };
    let names: Vec<String> = select_comparisons(table.profiles(), reference, filter)
        .into_iter()
        .map(String::from)
        .collect();
    let message = if names.is_empty() {
        format!("No municipality matches {}", reference.name)
    } else {
        names.join("\n")
    };
    Ok(Out::new(message, names))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::args::{FilterArgs, YearArgs};
    use crate::test::{TestEnv, FIXTURE_YEAR, FUND_PATH};

    fn year() -> YearArgs {
        YearArgs::new(Some(FIXTURE_YEAR), Document::Begroting)
    }

    #[tokio::test]
    async fn test_municipalities_sorted() {
        let env = TestEnv::new().await;
        let out = municipalities(env.config(), MunicipalitiesArgs::new(year()))
            .await
            .unwrap();
        assert_eq!(
            out.structure().unwrap(),
            &vec!["Amersfoort", "De Bilt", "Houten", "Utrecht", "Zeist"]
        );
    }

    #[tokio::test]
    async fn test_municipalities_missing_accounts() {
        let env = TestEnv::new().await;
        let year = YearArgs::new(Some(FIXTURE_YEAR), Document::Jaarrekening);
        let args = MunicipalitiesArgs::new(year);
        let err = municipalities(env.config(), args).await.unwrap_err();
        assert_eq!(err.error_type(), ErrorType::Input);
    }

    #[tokio::test]
    async fn test_circulaires() {
        let env = TestEnv::new().await;
        let out = circulaires(env.config(), CirculairesArgs::new(Some(FIXTURE_YEAR)))
            .await
            .unwrap();
        let options = out.structure().unwrap();
        assert_eq!(options.len(), 1);
        assert_eq!(options[0].path, FUND_PATH);
        assert!(out.message().contains("September 2024"));
    }

    #[tokio::test]
    async fn test_compare_filters() {
        let env = TestEnv::new().await;
        let structure = CompareArgs::new("Utrecht", year(), FilterArgs::new(true, false));
        let out = compare(env.config(), structure).await.unwrap();
        assert_eq!(
            out.structure().unwrap(),
            &vec!["Zeist", "Amersfoort", "Houten"]
        );

        let both = CompareArgs::new("Utrecht", year(), FilterArgs::new(true, true));
        let out = compare(env.config(), both).await.unwrap();
        assert_eq!(out.structure().unwrap(), &vec!["Amersfoort"]);

        let none = CompareArgs::new("Utrecht", year(), FilterArgs::default());
        let out = compare(env.config(), none).await.unwrap();
        assert_eq!(out.structure().unwrap().len(), 4);
    }

    #[tokio::test]
    async fn test_compare_unknown_municipality() {
        let env = TestEnv::new().await;
        let args = CompareArgs::new("Atlantis", year(), FilterArgs::default());
        let err = compare(env.config(), args).await.unwrap_err();
        assert_eq!(err.error_type(), ErrorType::Input);
    }
}
