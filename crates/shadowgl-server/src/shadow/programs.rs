use shadowgl_types::gl::{GLint, GLuint};

use crate::names::NameMap;

/// Locations resolved for one program since its last link.
#[derive(Debug, Default)]
pub struct ProgramLocations {
    attribs: NameMap<String, GLint>,
    uniforms: NameMap<String, GLint>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LocationKind {
    Attrib,
    Uniform,
}

/// Attribute and uniform location lookups, cached per program.
///
/// Only answers the driver gave after the program's most recent link are cached; linking or
/// deleting a program drops its entry.
#[derive(Debug, Default)]
pub struct ProgramCache {
    programs: NameMap<GLuint, ProgramLocations>,
}

impl ProgramCache {
    fn table(&self, program: GLuint, kind: LocationKind) -> Option<&NameMap<String, GLint>> {
        let locations = self.programs.lookup(&program)?;
        Some(match kind {
            LocationKind::Attrib => &locations.attribs,
            LocationKind::Uniform => &locations.uniforms,
        })
    }

    pub fn lookup(&self, program: GLuint, kind: LocationKind, name: &str) -> Option<GLint> {
        self.table(program, kind)?.lookup(&name.to_string()).copied()
    }

    pub fn store(&mut self, program: GLuint, kind: LocationKind, name: &str, location: GLint) {
        if self.programs.lookup(&program).is_none() {
            self.programs.insert(program, ProgramLocations::default());
        }
        if let Some(locations) = self.programs.lookup_mut(&program) {
            let table = match kind {
                LocationKind::Attrib => &mut locations.attribs,
                LocationKind::Uniform => &mut locations.uniforms,
            };
            table.insert(name.to_string(), location);
        }
    }

    pub fn invalidate(&mut self, program: GLuint) {
        self.programs.remove(&program);
    }

    pub fn len(&self) -> usize {
        self.programs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.programs.is_empty()
    }
}
