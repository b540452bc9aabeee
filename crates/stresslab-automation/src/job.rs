//! Static structural job: from settings to a solver deck.

use std::path::{Path, PathBuf};

use stresslab_core::{SimulationSettings, StressComponent};

use crate::deck::ApdlDeck;
use crate::engine::Workspace;
use crate::{Error, Result};

/// Material number used for the single isotropic material.
const MATERIAL: u32 = 1;

/// Element type slot used for the single element type.
const ELEMENT_SLOT: u32 = 1;

/// One static structural analysis of an imported CAD part.
///
/// The load case is fixed-face / loaded-face: every node on the plane
/// `X = support_x` is fully constrained and every node on `X = load_x`
/// carries `force_fx` along X.
#[derive(Clone, Debug, PartialEq)]
pub struct SimulationJob {
    /// Absolute path of the IGES model.
    pub cad_file: PathBuf,
    /// Model, material, and load settings.
    pub settings: SimulationSettings,
}

impl SimulationJob {
    /// Build a job, resolving the CAD path against the current directory.
    ///
    /// Fails with [`Error::CadFileNotFound`] when the model is absent.
    pub fn new(settings: SimulationSettings) -> Result<Self> {
        let cad_file = absolute(&settings.cad_file)?;
        if !cad_file.exists() {
            tracing::error!(
                path = %cad_file.display(),
                "CAD file not found; place the model there or set simulation.cad_file"
            );
            return Err(Error::CadFileNotFound { path: cad_file });
        }
        Ok(Self { cad_file, settings })
    }

    /// Stress components this job extracts.
    pub fn components(&self) -> &[StressComponent] {
        &self.settings.stress_components
    }

    /// Full deck: import, mesh, material, constraints, load, solve, and
    /// nodal stress extraction into `workspace`.
    pub fn build_deck(&self, workspace: &Workspace) -> Result<ApdlDeck> {
        let s = &self.settings;
        let mut deck = ApdlDeck::new();

        deck.comment("Stresslab static structural run")
            .clear()
            .prep7();

        deck.comment("Geometry");
        deck.igesin(&self.cad_file)?;

        deck.comment("Element type and mesh")
            .et(ELEMENT_SLOT, s.element_type)
            .esize(s.mesh_size)
            .vmesh("ALL");

        deck.comment("Material")
            .mp("EX", MATERIAL, s.youngs_modulus)
            .mp("PRXY", MATERIAL, s.poisson_ratio);

        deck.comment("Fixed support")
            .nsel_loc("S", "X", s.support_x)
            .d("ALL", "ALL", 0.0)
            .allsel();

        deck.comment("Applied load")
            .nsel_loc("S", "X", s.load_x)
            .f("ALL", "FX", s.force_fx)
            .allsel()
            .finish();

        deck.comment("Solve")
            .solu()
            .antype_static()
            .solve()
            .finish();

        deck.comment("Nodal stress extraction")
            .post1()
            .set(s.load_step, s.substep)
            .write_nodal_stress(&workspace.stress_file_stem(), &s.stress_components)
            .finish()
            .exit();

        Ok(deck)
    }
}

fn absolute(path: &Path) -> Result<PathBuf> {
    std::path::absolute(path).map_err(|e| Error::io(path, e))
}
