use clap::Args;
use itertools::Itertools;
use miette::{Context, IntoDiagnostic, Result};
use rk_fork::TypeCode;
use std::{fs::File, io::Write, path::PathBuf};
use tracing::info;

#[derive(Args)]
pub struct ExtractArgs {
    /// Ndat or Rez files, later files override earlier ones
    #[arg(required = true, value_name = "FILES")]
    files: Vec<PathBuf>,

    /// A target directory
    #[arg(short, long, value_name = "DIR")]
    directory: PathBuf,

    /// Only extract resources of this type
    #[arg(short, long, value_name = "TYPE", value_parser = super::parse_type)]
    r#type: Option<TypeCode>,

    /// Allow overwriting the target
    #[arg(long, default_value_t = false)]
    overwrite: bool,
}

impl ExtractArgs {
    pub fn handle(&self) -> Result<()> {
        let fork = super::load(&self.files)?;

        let codes = match self.r#type {
            Some(code) => vec![code],
            None => fork.all_types(),
        };

        for code in codes {
            let target = self.directory.join(super::type_dir(code));
            std::fs::create_dir_all(&target)
                .into_diagnostic()
                .context(format!("creating {}", target.display()))?;

            // the first resource of an id is the one a lookup would return
            for resource in fork.resources_of_type(code).into_iter().unique_by(|r| r.id()) {
                let p = target.join(format!("{}.bin", resource.id()));
                info!("writing {}", p.display());

                let data = resource
                    .data()
                    .context(format!("reading '{code}' {}", resource.id()))?;

                let mut out = if !self.overwrite {
                    File::create_new(&p)
                        .into_diagnostic()
                        .context(format!("creating {}", &p.display()))?
                } else {
                    File::create(&p)
                        .into_diagnostic()
                        .context(format!("creating {}", &p.display()))?
                };

                out.write_all(&data).into_diagnostic()?;
            }
        }

        Ok(())
    }
}
