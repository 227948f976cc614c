use crate::args::AnalyseArgs;
use crate::commands::{resolve_year, Out};
use crate::error::{Error, ErrorType, IntoResult, PipelineError, Res};
use crate::pipeline::{
    select_comparisons, Analysis, ComparisonFilter, ComparisonSet, LocalSide, Reconciliation,
};
use crate::report::{chart_dataset, chart_table, reconciliation_tables, ChartDataset, Series};
use crate::session::{OverrideTable, Selection, Session};
use crate::source::{available_circulaires, Catalog, CirculaireOption, Document};
use crate::{Config, Result};
use anyhow::{anyhow, Context};
use serde::Serialize;
use tracing::{debug, info};

/// The structured result of `begroting analyse`.
#[derive(Debug, Clone, Serialize)]
pub struct AnalysisReport {
    pub municipality: String,
    pub year: i32,
    pub document: Document,
    pub circulaire: CirculaireOption,
    pub overhead_allocated: bool,
    pub overridden: bool,
    pub comparisons: Vec<String>,
    pub reconciliation: Reconciliation,
    pub chart: ChartDataset,
}

fn data_error(e: PipelineError) -> Error {
    Error::new(ErrorType::Data, e)
}

/// Picks the requested circular, or the first one that applies to `year`. A request can name the
/// fund path (`S2024_2025`) or the circular alone (`S2024`).
fn select_circulaire(config: &Config, year: i32, requested: Option<&str>) -> Res<CirculaireOption> {
    let options = available_circulaires(year, config.latest_circulaire());
    let found = match requested {
        None => options.first().cloned(),
        Some(r) => options
            .iter()
            .find(|o| o.path.eq_ignore_ascii_case(r) || o.path.starts_with(&format!("{r}_")))
            .cloned(),
    };
    found.ok_or_else(|| {
        let paths: Vec<&str> = options.iter().map(|o| o.path.as_str()).collect();
        match requested {
            Some(r) if !paths.is_empty() => anyhow!(
                "The circular '{r}' does not apply to {year}, choose from {}",
                paths.join(", ")
            ),
            _ => anyhow!(
                "No circular applies to {year}, the latest circular is {}",
                config.latest_circulaire()
            ),
        }
    })
}

/// Runs the analysis of one municipality: aggregation into clusters, optional overhead
/// allocation, sign normalization and reconciliation against the fund allocation. The chart
/// dataset holds the municipality, its comparison municipalities and the fund, in that order.
///
/// # Errors
/// - `Input` when the year, circular, municipality, comparison or override is not valid for the
///   selection.
/// - `Source` when a table cannot be fetched or parsed.
/// - `Data` when the data of the selection cannot be analysed, e.g. a zero salary total.
pub async fn analyse(config: Config, args: AnalyseArgs) -> Result<Out<AnalysisReport>> {
    let document = args.year().document();
    let year = resolve_year(&config, args.year().year(), document)?;
    let circulaire =
        select_circulaire(&config, year, args.circulaire()).pub_result(ErrorType::Input)?;
    let taxonomy = config.taxonomy().await.pub_result(ErrorType::Config)?;
    let mut catalog = Catalog::new(config.source().pub_result(ErrorType::Config)?);

    let table = catalog
        .iv3(year, document)
        .await
        .pub_result(ErrorType::Source)?;
    let profile = table
        .profile(args.municipality())
        .ok_or_else(|| {
            Error::new(
                ErrorType::Input,
                anyhow!(
                    "The municipality '{}' is not in the Iv3 table of {year}",
                    args.municipality()
                ),
            )
        })?
        .clone();
    for (label, clusters) in taxonomy.ambiguous_labels(table.labels()) {
        debug!("'{label}' counts in {}", clusters.join(" and "));
    }

    let mut session = Session::new();
    session.select(Selection::new(year, &profile.name));
    if let Some(path) = args.override_file() {
        let override_table = OverrideTable::load(path)
            .await
            .pub_result(ErrorType::Input)?;
        session
            .set_override(override_table)
            .pub_result(ErrorType::Input)?;
        info!("Using the override table {}", path.display());
    }

    let (_, detail) = catalog
        .detail(year, document, &profile.name)
        .await
        .pub_result(ErrorType::Source)?;
    let residents = catalog
        .residents(year, document, &profile.name)
        .await
        .pub_result(ErrorType::Source)?;
    let local = LocalSide::compute(
        &detail,
        session.active_override(),
        &taxonomy,
        args.overhead(),
    )
    .map_err(data_error)?;
    let overridden = local.aggregation.is_overridden();
    let fund = catalog
        .allocation(&circulaire.path, &profile.name)
        .await
        .pub_result(ErrorType::Source)?;
    let analysis = Analysis::compute(local, fund, residents, &taxonomy).map_err(data_error)?;

    let comparisons =
        ComparisonSet::new(args.compare().iter().cloned()).pub_result(ErrorType::Input)?;
    let mut series = vec![Series::local(&profile.name, &analysis.local.net, residents)];
    if !comparisons.is_empty() {
        let filter = ComparisonFilter {
            same_structure: args.filter().same_structure(),
            same_centrum: args.filter().same_centrum(),
        };
        let allowed = select_comparisons(table.profiles(), &profile, filter);
        comparisons
            .check_allowed(&allowed)
            .pub_result(ErrorType::Input)?;
        for target in comparisons.targets() {
            debug!("Computing the comparison with {target}");
            let (_, detail) = catalog
                .detail(year, document, target)
                .await
                .pub_result(ErrorType::Source)?;
            let residents = catalog
                .residents(year, document, target)
                .await
                .pub_result(ErrorType::Source)?;
            // a comparison never uses the override of the selection
            let local = LocalSide::compute(&detail, None, &taxonomy, args.overhead())
                .map_err(data_error)?;
            series.push(Series::local(target, &local.net, residents));
        }
    }
    series.push(Series::fund(&analysis.fund, residents));
    let chart = chart_dataset(&series, args.measure()).map_err(data_error)?;

    let report = AnalysisReport {
        municipality: profile.name.clone(),
        year,
        document,
        circulaire,
        overhead_allocated: args.overhead(),
        overridden,
        comparisons: comparisons.targets().to_vec(),
        reconciliation: analysis.reconciliation,
        chart,
    };
    let message = if args.json() {
        serde_json::to_string_pretty(&report)
            .context("Unable to serialize the analysis")
            .pub_result(ErrorType::Output)?
    } else {
        format!(
            "{}\n\n{}",
            reconciliation_tables(&report.reconciliation),
            chart_table(&report.chart)
        )
    };
    Ok(Out::new(message, report))
}
