use clap::Args;
use itertools::Itertools;
use miette::Result;
use owo_colors::OwoColorize;
use rk_fork::TypeCode;
use std::path::PathBuf;

#[derive(Args)]
pub struct ListArgs {
    /// Ndat or Rez files, later files override earlier ones
    #[arg(required = true, value_name = "FILES")]
    files: Vec<PathBuf>,

    /// Only list resources of this type
    #[arg(short, long, value_name = "TYPE", value_parser = super::parse_type)]
    r#type: Option<TypeCode>,

    /// Also list resources hidden by a later file
    #[arg(long, default_value_t = false)]
    all: bool,
}

impl ListArgs {
    pub fn handle(&self) -> Result<()> {
        let fork = super::load(&self.files)?;

        for directory in fork.directories() {
            let path = directory
                .path()
                .map(|p| p.display().to_string())
                .unwrap_or_default();
            println!(
                "{} {} ({} types, {} resources{})",
                directory.format().cyan(),
                path.bold(),
                directory.len(),
                directory.resource_count(),
                if directory.is_read_only() { ", read only" } else { "" }
            );
        }

        let codes = match self.r#type {
            Some(code) => vec![code],
            None => fork.all_types().into_iter().sorted().collect(),
        };

        for code in codes {
            let resources = fork.resources_of_type(code);
            let resources = if self.all {
                resources.into_iter().sorted_by_key(|r| r.id()).collect_vec()
            } else {
                resources
                    .into_iter()
                    .unique_by(|r| r.id())
                    .sorted_by_key(|r| r.id())
                    .collect_vec()
            };

            println!("\n{} {}", "type".dimmed(), format!("'{code}'").green());
            for resource in resources {
                let file = resource
                    .directory()
                    .path()
                    .and_then(|p| p.file_name())
                    .map(|f| f.to_string_lossy().into_owned())
                    .unwrap_or_default();
                println!(
                    "  {:>6}  {:>8}  {:<32}  {}",
                    resource.id().yellow(),
                    resource.size(),
                    resource.name().unwrap_or_default(),
                    file.dimmed()
                );
            }
        }

        Ok(())
    }
}
