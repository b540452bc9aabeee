//! APDL command deck builder.
//!
//! The solver is driven in batch mode from a plain-text input deck. Each
//! builder method appends one command; [`ApdlDeck::render`] joins them into
//! the file handed to the solver.

use std::fmt::{self, Display};
use std::path::Path;

use stresslab_core::StressComponent;

use crate::{Error, Result};

/// Prefix for array parameters the extraction block defines.
const ARRAY_PREFIX: &str = "SL_";

/// An ordered list of APDL commands.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ApdlDeck {
    lines: Vec<String>,
}

impl ApdlDeck {
    /// Empty deck.
    pub fn new() -> Self {
        Self::default()
    }

    /// Commands in order.
    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    /// Returns `true` if any line starts with `prefix` (case-insensitive).
    pub fn contains_command(&self, prefix: &str) -> bool {
        let prefix = prefix.to_uppercase();
        self.lines.iter().any(|l| l.to_uppercase().starts_with(&prefix))
    }

    /// Deck text, one command per line.
    pub fn render(&self) -> String {
        let mut out = self.lines.join("\n");
        out.push('\n');
        out
    }

    /// Append a `!` comment line.
    pub fn comment(&mut self, text: &str) -> &mut Self {
        self.lines.push(format!("! {text}"));
        self
    }

    /// Append `NAME,arg1,arg2,...`, dropping trailing empty arguments.
    pub fn command(&mut self, name: &str, args: &[&dyn Display]) -> &mut Self {
        let mut parts: Vec<String> = args.iter().map(|a| a.to_string()).collect();
        while parts.last().is_some_and(|p| p.is_empty()) {
            parts.pop();
        }
        if parts.is_empty() {
            self.lines.push(name.to_string());
        } else {
            self.lines.push(format!("{name},{}", parts.join(",")));
        }
        self
    }

    /// Raw line, emitted as-is.
    pub fn raw(&mut self, line: impl Into<String>) -> &mut Self {
        self.lines.push(line.into());
        self
    }

    // ------------------------------------------------------------------------
    // Session and processors
    // ------------------------------------------------------------------------

    /// Clear the database without reading the start-up file.
    pub fn clear(&mut self) -> &mut Self {
        self.command("/CLEAR", &[&"NOSTART"])
    }

    /// Enter the preprocessor.
    pub fn prep7(&mut self) -> &mut Self {
        self.command("/PREP7", &[])
    }

    /// Enter the solution processor.
    pub fn solu(&mut self) -> &mut Self {
        self.command("/SOLU", &[])
    }

    /// Enter the general postprocessor.
    pub fn post1(&mut self) -> &mut Self {
        self.command("/POST1", &[])
    }

    /// Leave the current processor.
    pub fn finish(&mut self) -> &mut Self {
        self.command("FINISH", &[])
    }

    /// End the session without saving the database.
    pub fn exit(&mut self) -> &mut Self {
        self.command("/EXIT", &[&"NOSAVE"])
    }

    // ------------------------------------------------------------------------
    // Preprocessing
    // ------------------------------------------------------------------------

    /// Import an IGES model.
    ///
    /// The solver takes the name without extension, the extension, and the
    /// directory as separate fields, none of which may contain a comma.
    pub fn igesin(&mut self, path: &Path) -> Result<&mut Self> {
        let invalid = |reason: &str| Error::InvalidPath {
            path: path.to_path_buf(),
            reason: reason.to_string(),
        };

        let text = path.to_str().ok_or_else(|| invalid("not valid UTF-8"))?;
        if text.contains(',') || text.contains('\'') {
            return Err(invalid("contains a comma or quote"));
        }
        if text.len() > 248 {
            return Err(invalid("longer than 248 characters"));
        }

        let stem = path
            .file_stem()
            .and_then(|s| s.to_str())
            .ok_or_else(|| invalid("has no file name"))?;
        let ext = path.extension().and_then(|s| s.to_str()).unwrap_or("");
        let dir = path.parent().and_then(|p| p.to_str()).unwrap_or("");

        Ok(self.command("IGESIN", &[&stem, &ext, &dir]))
    }

    /// Define element type `itype` as element number `ename`.
    pub fn et(&mut self, itype: u32, ename: u32) -> &mut Self {
        self.command("ET", &[&itype, &ename])
    }

    /// Set the global element edge length.
    pub fn esize(&mut self, size: f64) -> &mut Self {
        self.command("ESIZE", &[&ApdlNum(size)])
    }

    /// Mesh volumes.
    pub fn vmesh(&mut self, volumes: &str) -> &mut Self {
        self.command("VMESH", &[&volumes])
    }

    /// Define a linear material property.
    pub fn mp(&mut self, label: &str, mat: u32, value: f64) -> &mut Self {
        self.command("MP", &[&label, &mat, &ApdlNum(value)])
    }

    /// Select nodes by location.
    pub fn nsel_loc(&mut self, kind: &str, axis: &str, value: f64) -> &mut Self {
        self.command("NSEL", &[&kind, &"LOC", &axis, &ApdlNum(value)])
    }

    /// Re-select everything.
    pub fn allsel(&mut self) -> &mut Self {
        self.command("ALLSEL", &[])
    }

    // ------------------------------------------------------------------------
    // Loads and solution
    // ------------------------------------------------------------------------

    /// Constrain degrees of freedom on nodes.
    pub fn d(&mut self, node: &str, lab: &str, value: f64) -> &mut Self {
        self.command("D", &[&node, &lab, &ApdlNum(value)])
    }

    /// Apply a nodal force.
    pub fn f(&mut self, node: &str, lab: &str, value: f64) -> &mut Self {
        self.command("F", &[&node, &lab, &ApdlNum(value)])
    }

    /// Static analysis type.
    pub fn antype_static(&mut self) -> &mut Self {
        self.command("ANTYPE", &[&"STATIC"])
    }

    /// Solve the current load step.
    pub fn solve(&mut self) -> &mut Self {
        self.command("SOLVE", &[])
    }

    // ------------------------------------------------------------------------
    // Postprocessing
    // ------------------------------------------------------------------------

    /// Read a result set.
    pub fn set(&mut self, load_step: u32, substep: u32) -> &mut Self {
        self.command("SET", &[&load_step, &substep])
    }

    /// Write nodal stress for every node to `<file_name>.csv` in the
    /// solver's working directory.
    ///
    /// Each line holds the node number, its selection status (1 when the
    /// node exists and is selected), and one value per component, in order.
    pub fn write_nodal_stress(
        &mut self,
        file_name: &str,
        components: &[StressComponent],
    ) -> &mut Self {
        let node = format!("{ARRAY_PREFIX}NODE");
        let mask = format!("{ARRAY_PREFIX}MASK");
        let arrays: Vec<(String, StressComponent)> = components
            .iter()
            .map(|c| (format!("{ARRAY_PREFIX}S{}", c.label()), *c))
            .collect();

        self.allsel();
        self.raw("*GET,SL_NMAX,NODE,0,NUM,MAXD");
        for name in std::iter::once(&node)
            .chain(std::iter::once(&mask))
            .chain(arrays.iter().map(|(n, _)| n))
        {
            self.raw(format!("*DEL,{name},,NOPR"));
            self.raw(format!("*DIM,{name},ARRAY,SL_NMAX"));
        }
        self.raw(format!("*VFILL,{node}(1),RAMP,1,1"));
        self.raw(format!("*VGET,{mask}(1),NODE,1,NSEL"));
        for (name, component) in &arrays {
            self.raw(format!("*VGET,{name}(1),NODE,1,S,{}", component.label()));
        }

        let mut vwrite_args = vec![format!("{node}(1)"), format!("{mask}(1)")];
        vwrite_args.extend(arrays.iter().map(|(n, _)| format!("{n}(1)")));
        let mut fmt = String::from("(F10.0,',',F4.0");
        for _ in &arrays {
            fmt.push_str(",',',E16.8");
        }
        fmt.push(')');

        self.command("*CFOPEN", &[&file_name, &"csv"]);
        self.raw(format!("*VWRITE,{}", vwrite_args.join(",")));
        self.raw(fmt);
        self.command("*CFCLOS", &[])
    }
}

/// Numeric argument, printed the shortest way that round-trips.
struct ApdlNum(f64);

impl Display for ApdlNum {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let v = self.0;
        if v != 0.0 && (v.abs() >= 1e6 || v.abs() < 1e-4) {
            write!(f, "{v:e}")
        } else {
            write!(f, "{v}")
        }
    }
}
