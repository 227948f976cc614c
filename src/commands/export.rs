use crate::args::ExportOverrideArgs;
use crate::commands::{resolve_year, Out};
use crate::error::{ErrorType, IntoResult};
use crate::session::{OverrideTable, Selection};
use crate::source::Catalog;
use crate::{utils, Config, Result};
use std::path::PathBuf;
use tracing::debug;

/// Writes the task fields of a municipality to an override file that can be edited and passed to
/// `begroting analyse --override`. The file is bound to the year and municipality.
pub async fn export_override(config: Config, args: ExportOverrideArgs) -> Result<Out<PathBuf>> {
    let document = args.year().document();
    let year = resolve_year(&config, args.year().year(), document)?;
    let mut catalog = Catalog::new(config.source().pub_result(ErrorType::Config)?);
    let table = catalog
        .iv3(year, document)
        .await
        .pub_result(ErrorType::Source)?;
    let (profile, detail) = table
        .detail(args.municipality())
        .pub_result(ErrorType::Input)?;

    let path = match args.output() {
        Some(path) => path.to_path_buf(),
        None => config
            .overrides()
            .join(format!("{}_{year}.json", profile.name)),
    };
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        utils::make_dir(parent).await.pub_result(ErrorType::Output)?;
    }
    let override_table = OverrideTable::from_detail(Selection::new(year, &profile.name), &detail);
    debug!(
        "Exporting {} task fields of {}",
        override_table.rows().len(),
        override_table.selection()
    );
    override_table
        .save(&path)
        .await
        .pub_result(ErrorType::Output)?;
    Ok(Out::new(
        format!("Wrote the override table to {}", path.display()),
        path,
    ))
}
