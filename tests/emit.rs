//! Integration tests for emitting complete routines.
//!
//! Each test registers routines the way a compiler's lowering phase would report them and
//! checks the encoded blobs, either byte for byte or after decoding them again.

use symscope::{
    debuginfo::{
        customdebuginformation::parse_custom_debug_info,
        importscope::parse_import_chain,
        lambdamap::{encode_lambda_map, parse_lambda_map},
        scope::{encode_scopes, parse_scopes},
        sequencepoints::{encode_sequence_points, parse_sequence_points},
    },
    prelude::*,
};

fn emit(routines: Vec<RoutineBody>, options: EmitOptions) -> Result<DebugInfoStream> {
    let mut emitter = Emitter::new(options);
    emitter.add_document("Program.cs");
    for routine in routines {
        emitter.add_routine(routine)?;
    }
    emitter.emit(&NoSources)
}

fn lambda_map_of(record: &MethodDebugRecord) -> Result<LambdaMap> {
    let cdi = parse_custom_debug_info(&record.custom_debug_info)?;
    cdi.lambda_map()
        .cloned()
        .ok_or_else(|| Error::Error(format!("{} has no lambda map", record.token)))
}

fn usings() -> ImportChain {
    ImportChain::new(vec![
        ImportLevel::new(vec![
            ImportItem::namespace("System.Linq"),
            ImportItem::extern_alias("A"),
        ]),
        ImportLevel::new(vec![ImportItem::namespace("System")]),
    ])
}

// `usings()` in emission order
fn canonical_usings() -> ImportChain {
    let mut chain = usings();
    chain.canonicalize();
    chain
}

/// A single statement at offset 0: the first record carries an offset delta of 0 and the
/// absolute start position.
#[test]
fn test_single_point_absolute_start() -> Result<()> {
    let stream = emit(
        vec![RoutineBody::new(Token::method_def(1), "Program", "Main", 2)
            .mark(0, SourceSpan::on_line(1, 5, 5, 6))],
        EmitOptions::default(),
    )?;

    // local signature, document, δIL, δLines, δColumns, start line, start column
    assert_eq!(stream.methods[0].sequence_points, [0, 1, 0, 0, 1, 5, 5]);

    let points = parse_sequence_points(&stream.methods[0].sequence_points)?;
    assert_eq!(
        points.points,
        [SequencePoint::Visible {
            il_offset: 0,
            span: SourceSpan::on_line(1, 5, 5, 6),
        }]
    );
    Ok(())
}

/// One closure with a lambda capturing through it, and two lambdas capturing nothing.
#[test]
fn test_closure_and_static_lambdas() -> Result<()> {
    let stream = emit(
        vec![RoutineBody::new(Token::method_def(1), "Program", "Run", 0x30)
            .closure(0, None)
            .lambda(10, LambdaClosure::Closure(0))
            .lambda(20, LambdaClosure::Static)
            .lambda(30, LambdaClosure::Static)],
        EmitOptions::default(),
    )?;

    let map = lambda_map_of(&stream.methods[0])?;
    assert_eq!(map.method_ordinal, 0);
    assert_eq!(
        map.closures,
        [ClosureInfo {
            syntax_offset: 0,
            parent: None
        }]
    );
    assert_eq!(map.lambdas[0].closure, LambdaClosure::Closure(0));
    assert_eq!(map.lambdas[1].closure.index(), None);
    assert_eq!(map.lambdas[2].closure.index(), None);
    assert_eq!(map.lambdas_of(0).count(), 1);

    // ordinal + 1, -baseline, 1 closure (offset 0 + 1, no parent), three lambdas
    assert_eq!(
        encode_lambda_map(&map)?,
        [1, 1, 1, 1, 0, 11, 2, 21, 1, 31, 1]
    );
    Ok(())
}

/// Nested blocks `[0, 0x60) ⊃ [0x20, 0x55) ⊃ [0x30, 0x55)` sharing an end offset.
#[test]
fn test_nested_scopes_sharing_end() -> Result<()> {
    let stream = emit(
        vec![RoutineBody::new(Token::method_def(1), "Program", "Loop", 0x60)
            .declare(LocalBinding::new("args", 0))
            .enter(0x20)
            .declare(LocalBinding::new("i", 1))
            .enter(0x30)
            .declare(LocalBinding::new("item", 2))
            .exit(0x55)
            .exit(0x55)],
        EmitOptions::default(),
    )?;

    let tree = parse_scopes(&stream.methods[0].scopes)?;
    let outer = &tree.root.children[0];
    let inner = &outer.children[0];
    assert_eq!((tree.root.start_offset, tree.root.end_offset), (0, 0x60));
    assert_eq!((outer.start_offset, outer.end_offset), (0x20, 0x55));
    assert_eq!((inner.start_offset, inner.end_offset), (0x30, 0x55));
    assert!(tree.root.encloses(outer) && outer.encloses(inner));
    assert_eq!(tree.scope_count(), 3);

    assert_eq!(
        tree.locals_at(0x40)
            .iter()
            .map(|local| local.name.as_str())
            .collect::<Vec<_>>(),
        ["args", "i", "item"]
    );
    assert_eq!(encode_scopes(&tree)?, stream.methods[0].scopes);
    Ok(())
}

/// A lambda in a field initializer is lowered into the constructor with a negative syntax
/// offset and keeps its discovery order.
#[test]
fn test_constructor_lambda_negative_offset() -> Result<()> {
    let stream = emit(
        vec![RoutineBody::new(Token::method_def(1), "Program", ".ctor", 0x10)
            .lambda(-20, LambdaClosure::Static)
            .lambda(4, LambdaClosure::ThisOnly)],
        EmitOptions::default(),
    )?;

    let map = lambda_map_of(&stream.methods[0])?;
    assert_eq!(map.lambdas[0].syntax_offset, -20);
    assert_eq!(map.lambdas[1].syntax_offset, 4);
    assert_eq!(map.syntax_offset_baseline(), -20);

    // ordinal + 1, -baseline, no closures, (-20 + 20, static), (4 + 20, this-only)
    assert_eq!(encode_lambda_map(&map)?, [1, 20, 0, 0, 1, 24, 0]);
    assert_eq!(parse_lambda_map(&encode_lambda_map(&map)?)?, map);
    Ok(())
}

#[test]
fn test_hidden_points_and_document_switch() -> Result<()> {
    let mut emitter = Emitter::new(EmitOptions::default());
    let first = emitter.add_document("a.cs");
    let second = emitter.add_document("b.cs");
    assert_eq!((first, second), (1, 2));
    assert_eq!(emitter.add_document("a.cs"), 1);

    emitter.add_routine(
        RoutineBody::new(Token::method_def(3), "C", "M", 0x20)
            .with_prologue()
            .mark(0x02, SourceSpan::on_line(first, 10, 9, 20))
            .mark_hidden(0x08)
            .mark(0x0C, SourceSpan::new(second, 3, 1, 4, 2)),
    )?;
    let stream = emitter.emit(&NoSources)?;
    let record = &stream.methods[0];
    assert!(record.starts_hidden);

    let points = parse_sequence_points(&record.sequence_points)?;
    assert_eq!(points.len(), 4);
    assert!(points.points[0].is_hidden());
    assert_eq!(points.points[2].document(), first);
    assert_eq!(points.points[3].document(), second);
    assert_eq!(
        points.covering(0x10).and_then(SequencePoint::span),
        Some(&SourceSpan::new(second, 3, 1, 4, 2))
    );
    assert_eq!(encode_sequence_points(&points)?, record.sequence_points);
    Ok(())
}

#[test]
fn test_import_forwarding() -> Result<()> {
    let stream = emit(
        vec![
            RoutineBody::new(Token::method_def(1), "C", "A", 4).with_imports(usings()),
            RoutineBody::new(Token::method_def(2), "C", "B", 4),
            RoutineBody::new(Token::method_def(3), "D", "C", 4).with_imports(usings()),
        ],
        EmitOptions::default(),
    )?;

    let ImportsRecord::Chain(blob) = &stream.methods[0].imports else {
        panic!("first routine must carry the chain");
    };
    let chain = parse_import_chain(blob)?;
    // extern aliases lead their level
    assert_eq!(
        chain.levels[0].items,
        [
            ImportItem::extern_alias("A"),
            ImportItem::namespace("System.Linq")
        ]
    );
    assert_eq!(chain.using_counts(), [2, 1]);

    assert_eq!(stream.methods[1].imports, ImportsRecord::None);
    assert_eq!(
        stream.methods[2].imports,
        ImportsRecord::Forward(Token::method_def(1))
    );
    let cdi = parse_custom_debug_info(&stream.methods[2].custom_debug_info)?;
    assert_eq!(cdi.forward(), Some(Token::method_def(1)));
    assert_eq!(cdi.using_counts(), None);

    // the forwarder sees exactly the owner's chain
    let symbols = SymbolReader::new(&stream).read()?;
    assert_eq!(symbols.resolve_imports(Token::method_def(3)), Some(&chain));
    assert_eq!(
        symbols.resolve_imports(Token::method_def(3)),
        symbols.resolve_imports(Token::method_def(1))
    );
    assert_eq!(symbols.resolve_imports(Token::method_def(2)), None);
    Ok(())
}

#[test]
fn test_shared_state_across_emitters() -> Result<()> {
    let ordinals = OrdinalAllocator::new();
    let chains = std::sync::Arc::new(ImportChainTable::new());

    let mut first = Emitter::with_shared(EmitOptions::default(), ordinals.clone(), chains.clone());
    first.add_routine(
        RoutineBody::new(Token::method_def(1), "C", "A", 4)
            .with_imports(usings())
            .lambda(0, LambdaClosure::Static),
    )?;
    first.emit(&NoSources)?;

    let mut second = Emitter::with_shared(EmitOptions::default(), ordinals, chains);
    second.add_routine(
        RoutineBody::new(Token::method_def(2), "C", "B", 4)
            .with_imports(usings())
            .lambda(0, LambdaClosure::Static),
    )?;
    let stream = second.emit(&NoSources)?;

    assert_eq!(stream.methods[0].method_ordinal, Some(1));
    assert_eq!(
        stream.methods[0].imports,
        ImportsRecord::Forward(Token::method_def(1))
    );
    Ok(())
}

/// A preset ordinal is claimed on registration, so the next routine of the type with
/// lambdas gets a fresh one and a second claim of the same ordinal is refused.
#[test]
fn test_preset_ordinals_are_never_reused() -> Result<()> {
    let mut emitter = Emitter::new(EmitOptions::default());
    emitter.add_routine(
        RoutineBody::new(Token::method_def(1), "C", "A", 4)
            .with_method_ordinal(0)
            .lambda(0, LambdaClosure::Static),
    )?;
    emitter.add_routine(
        RoutineBody::new(Token::method_def(2), "C", "B", 4).lambda(0, LambdaClosure::Static),
    )?;
    emitter.add_routine(
        RoutineBody::new(Token::method_def(3), "C", ".ctor", 4)
            .with_method_ordinal(5)
            .lambda(-20, LambdaClosure::Static),
    )?;
    emitter.add_routine(
        RoutineBody::new(Token::method_def(4), "C", "D", 4).lambda(0, LambdaClosure::Static),
    )?;

    assert!(matches!(
        emitter.add_routine(
            RoutineBody::new(Token::method_def(5), "C", "E", 4)
                .with_method_ordinal(1)
                .lambda(0, LambdaClosure::Static),
        ),
        Err(Error::DuplicateOrdinal { ordinal: 1, .. })
    ));
    assert_eq!(emitter.routine_count(), 4);

    let stream = emitter.emit(&NoSources)?;
    let ordinals: Vec<_> = stream.methods.iter().map(|m| m.method_ordinal).collect();
    assert_eq!(ordinals, [Some(0), Some(1), Some(5), Some(6)]);
    for record in &stream.methods {
        assert_eq!(Some(lambda_map_of(record)?.method_ordinal), record.method_ordinal);
    }
    Ok(())
}

/// A failed emit leaves the shared import table untouched: a later stream owns the chain
/// itself instead of forwarding into the discarded one.
#[test]
fn test_failed_emit_publishes_no_owners() -> Result<()> {
    let chains = std::sync::Arc::new(ImportChainTable::new());

    let mut first =
        Emitter::with_shared(EmitOptions::default(), OrdinalAllocator::new(), chains.clone());
    first.add_routine(RoutineBody::new(Token::method_def(1), "C", "A", 4).with_imports(usings()))?;
    first.add_routine(
        RoutineBody::new(Token::method_def(2), "C", "B", 4)
            .lambda(0, LambdaClosure::Static)
            .lambda(0x2000_0000, LambdaClosure::Static),
    )?;
    assert!(matches!(
        first.emit(&NoSources),
        Err(Error::ValueOutOfRange(_))
    ));
    assert!(chains.is_empty());

    let mut second =
        Emitter::with_shared(EmitOptions::default(), OrdinalAllocator::new(), chains.clone());
    second.add_routine(RoutineBody::new(Token::method_def(3), "C", "C", 4).with_imports(usings()))?;
    let stream = second.emit(&NoSources)?;

    assert!(matches!(stream.methods[0].imports, ImportsRecord::Chain(_)));
    assert_eq!(chains.owner_of(&canonical_usings()), Some(Token::method_def(3)));
    Ok(())
}

#[test]
fn test_parallel_matches_sequential() -> Result<()> {
    let routines = || {
        (1..=64)
            .map(|row| {
                let mut body =
                    RoutineBody::new(Token::method_def(row), format!("T{}", row % 4), "M", 0x40)
                        .mark(0, SourceSpan::on_line(1, row, 5, 30))
                        .mark_hidden(0x10)
                        .enter(0x10)
                        .declare(LocalBinding::new(format!("v{row}"), 0))
                        .exit(0x30)
                        .slot(LocalSlot::new(SynthesizedLocalKind::UserDefined, 12));
                if row % 3 == 0 {
                    body = body.closure(8, None).lambda(16, LambdaClosure::Closure(0));
                }
                if row % 2 == 0 {
                    body = body.with_imports(usings());
                }
                body
            })
            .collect::<Vec<_>>()
    };

    let parallel = emit(routines(), EmitOptions::default())?;
    let sequential = emit(routines(), EmitOptions::deterministic())?;
    assert_eq!(parallel.methods, sequential.methods);
    Ok(())
}

#[test]
fn test_errors_abort_emission() {
    let result = emit(
        vec![
            RoutineBody::new(Token::method_def(1), "C", "Fine", 4),
            RoutineBody::new(Token::method_def(2), "C", "Unbalanced", 8).enter(2),
        ],
        EmitOptions::default(),
    );
    assert!(matches!(
        result,
        Err(Error::OverlappingScope { token, .. }) if token == Token::method_def(2)
    ));

    let result = emit(
        vec![RoutineBody::new(Token::method_def(1), "C", "Dangling", 4)
            .lambda(0, LambdaClosure::Closure(3))],
        EmitOptions::default(),
    );
    assert!(matches!(
        result,
        Err(Error::UnresolvedCapture { closure: 3, .. })
    ));

    let result = emit(
        vec![RoutineBody::new(Token::method_def(1), "C", "Backwards", 8)
            .mark(4, SourceSpan::on_line(1, 2, 1, 5))
            .mark(2, SourceSpan::on_line(1, 3, 1, 5))],
        EmitOptions::default(),
    );
    assert!(matches!(result, Err(Error::MalformedSequence { .. })));
}

#[test]
fn test_long_names_degrade_to_warnings() -> Result<()> {
    let long = "x".repeat(MAX_NAME_LENGTH + 1);
    let stream = emit(
        vec![RoutineBody::new(Token::method_def(1), "C", "M", 8)
            .declare(LocalBinding::new(long.clone(), 0))
            .declare(LocalBinding::new("ok", 1))
            .with_imports(ImportChain::new(vec![ImportLevel::new(vec![
                ImportItem::namespace(long),
                ImportItem::namespace("System"),
            ])]))],
        EmitOptions::default(),
    )?;

    assert_eq!(stream.diagnostics.warnings().len(), 2);
    let tree = parse_scopes(&stream.methods[0].scopes)?;
    assert_eq!(tree.root.locals, [LocalBinding::new("ok", 1)]);

    let ImportsRecord::Chain(blob) = &stream.methods[0].imports else {
        panic!("chain expected");
    };
    assert_eq!(parse_import_chain(blob)?.using_counts(), [1]);
    Ok(())
}

#[test]
fn test_sources_and_source_link() -> Result<()> {
    let mut emitter = Emitter::new(EmitOptions::portable());
    let doc = emitter.add_document("Program.cs");
    emitter.add_document("Generated.cs");
    emitter.add_routine(
        RoutineBody::new(Token::method_def(1), "Program", "Main", 2)
            .mark(0, SourceSpan::on_line(doc, 1, 1, 2)),
    )?;

    let sources = MemorySources::new()
        .with_file("Program.cs", "class Program {}")
        .with_source_link(r#"{"documents":{"*":"https://example.invalid/*"}}"#);
    let stream = emitter.emit(&sources)?;

    let program = stream.documents.get(1).map(Document::checksum_hex);
    assert_eq!(
        program.as_deref().map(str::len),
        Some(40),
        "SHA-1 checksum expected"
    );
    assert!(stream
        .documents
        .get(2)
        .is_some_and(|doc| doc.checksum.is_empty()));
    assert_eq!(stream.embedded_source(1), Some(&b"class Program {}"[..]));
    assert_eq!(stream.embedded_source(2), None);
    assert!(stream.source_link().is_some());

    let table = DocumentTable::parse(&stream.documents.encode()?)?;
    assert_eq!(table, stream.documents);
    Ok(())
}
