//! Factories shared by the unit tests.

use crate::{
    debuginfo::{
        importscope::{ImportChain, ImportItem, ImportLevel},
        span::SourceSpan,
        token::Token,
    },
    emit::{DebugInfoStream, EmitOptions, Emitter, NoSources, RoutineBody},
};

// One level importing `System`
pub fn system_imports() -> ImportChain {
    ImportChain::new(vec![ImportLevel::new(vec![ImportItem::namespace("System")])])
}

// Routine `C.M<row>` with 8 bytes of IL and one visible point on line `row` of document 1
pub fn simple_routine(row: u32) -> RoutineBody {
    RoutineBody::new(Token::method_def(row), "C", format!("M{row}"), 8)
        .mark(0, SourceSpan::on_line(1, row, 5, 6))
}

// Emit `routines` against a single document `a.cs` with default options
pub fn emit_routines(routines: Vec<RoutineBody>) -> DebugInfoStream {
    let mut emitter = Emitter::new(EmitOptions::default());
    emitter.add_document("a.cs");
    for routine in routines {
        emitter.add_routine(routine).unwrap();
    }
    emitter.emit(&NoSources).unwrap()
}
