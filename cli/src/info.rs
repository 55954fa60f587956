pub use retro_egtb::{Material, MaterialWinner};

use std::path::PathBuf;
use std::str::FromStr;

use clap::Args;
use log::info;
use retroboard::shakmaty::Color;

/// `-subinfo`/`-i`: list a material key's dependency-ordered sub-endgames, and every table
/// file already present for it under `tb_dir`.
#[derive(Args, Debug)]
pub struct Info {
    #[arg(short, long, value_parser = Material::from_str, help = "example \"KQvK\"")]
    material: Material,
    #[arg(short = 'd', long, default_value = "table/")]
    tb_dir: PathBuf,
}

impl Info {
    pub fn run(&self) {
        info!("Sub-endgames of {:?}, fewest pieces first:", self.material);
        for sub in self.material.enumerate_subs() {
            for winner in Color::ALL {
                let path = self.tb_dir.join(format!(
                    "{:?}",
                    MaterialWinner::new(&sub, winner)
                ));
                let present = path.exists();
                let size = present
                    .then(|| std::fs::metadata(&path).map(|m| m.len()).ok())
                    .flatten();
                info!(
                    "  {:?} winner={winner} present={present} size_bytes={size:?}",
                    sub
                );
            }
        }
    }
}
