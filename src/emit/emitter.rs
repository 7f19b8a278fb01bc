//! The emission driver.

use std::{collections::HashMap, sync::Arc};

use rayon::prelude::*;

use crate::{
    debuginfo::{
        customdebuginformation::{
            encode_custom_debug_info, CustomDebugInfo, CustomDebugKind, CustomDebugRecord,
        },
        diagnostics::{Diagnostic, DiagnosticCategory, Diagnostics},
        document::DocumentTable,
        importscope::{encode_import_chain, ChainOwnership, ImportChain, ImportChainTable},
        lambdamap::{LambdaMap, LambdaMapBuilder},
        scope::{encode_scopes, ScopeTreeBuilder},
        sequencepoints::{encode_sequence_points, SequencePointBuilder},
        slotmap::LocalSlotMap,
        token::Token,
    },
    emit::{
        ordinal::OrdinalAllocator,
        options::EmitOptions,
        routine::{BlockEvent, RoutineBody, SequenceMark},
        stream::{
            embedded_source_blob, DebugInfoStream, ImportsRecord, MethodDebugRecord,
            SourceProvider, StreamBlob,
        },
    },
    Error, Result,
};

/// Produces a [`DebugInfoStream`] from lowered routines.
///
/// Documents and routines are registered in declaration order; [`Emitter::emit`] then
/// builds every routine independently, in parallel unless disabled, and resolves import
/// forwarding in one ordered pass. The same input always produces the same bytes.
///
/// The ordinal allocator and the import chain table can be shared between emitters with
/// [`Emitter::with_shared`], e.g. when several compilation units contribute to one module.
///
/// # Examples
///
/// ```rust
/// use symscope::{
///     debuginfo::{span::SourceSpan, token::Token},
///     emit::{EmitOptions, Emitter, NoSources, RoutineBody},
/// };
///
/// let mut emitter = Emitter::new(EmitOptions::default());
/// let doc = emitter.add_document("Program.cs");
/// emitter.add_routine(
///     RoutineBody::new(Token::method_def(1), "Program", "Main", 2)
///         .mark(0, SourceSpan::on_line(doc, 5, 5, 6)),
/// )?;
///
/// let stream = emitter.emit(&NoSources)?;
/// assert_eq!(stream.methods.len(), 1);
/// assert!(!stream.methods[0].sequence_points.is_empty());
/// # Ok::<(), symscope::Error>(())
/// ```
#[derive(Debug)]
pub struct Emitter {
    options: EmitOptions,
    ordinals: OrdinalAllocator,
    import_chains: Arc<ImportChainTable>,
    documents: Vec<String>,
    document_ids: HashMap<String, u32>,
    routines: Vec<RoutineBody>,
}

/// Per-routine result of the parallel phase.
struct BuiltRoutine {
    sequence_points: Vec<u8>,
    starts_hidden: bool,
    scopes: Vec<u8>,
    imports: Option<ImportChain>,
    slot_map: Option<LocalSlotMap>,
    lambda_map: Option<LambdaMap>,
    diagnostics: Vec<Diagnostic>,
}

impl Emitter {
    /// Create an emitter with its own ordinal allocator and import chain table.
    #[must_use]
    pub fn new(options: EmitOptions) -> Self {
        Self::with_shared(
            options,
            OrdinalAllocator::new(),
            Arc::new(ImportChainTable::new()),
        )
    }

    /// Create an emitter that allocates ordinals and interns import chains in shared state.
    #[must_use]
    pub fn with_shared(
        options: EmitOptions,
        ordinals: OrdinalAllocator,
        import_chains: Arc<ImportChainTable>,
    ) -> Self {
        Emitter {
            options,
            ordinals,
            import_chains,
            documents: Vec::new(),
            document_ids: HashMap::new(),
            routines: Vec::new(),
        }
    }

    /// The options in effect.
    #[must_use]
    pub fn options(&self) -> &EmitOptions {
        &self.options
    }

    /// Register a source document and return its 1-based id. Registering a path twice
    /// returns the first id.
    pub fn add_document(&mut self, path: impl Into<String>) -> u32 {
        let path = path.into();
        if let Some(id) = self.document_ids.get(&path) {
            return *id;
        }

        let id = self.documents.len() as u32 + 1;
        self.document_ids.insert(path.clone(), id);
        self.documents.push(path);
        id
    }

    /// Register a routine in declaration order.
    ///
    /// Routines with closures or lambdas and no preset ordinal get the next ordinal of their
    /// declaring type. A preset ordinal is claimed so that no later routine of the type
    /// receives it.
    ///
    /// # Errors
    /// Returns [`Error::DuplicateOrdinal`] if the preset ordinal is already taken and
    /// [`Error::LockError`] if the shared allocator is poisoned. The routine is not
    /// registered on error.
    pub fn add_routine(&mut self, mut body: RoutineBody) -> Result<()> {
        match body.method_ordinal {
            Some(ordinal) => self.ordinals.reserve(&body.declaring_type, ordinal)?,
            None if body.has_lambdas() => {
                body.method_ordinal = Some(self.ordinals.allocate(&body.declaring_type)?);
            }
            None => {}
        }
        self.routines.push(body);
        Ok(())
    }

    /// Number of registered routines.
    #[must_use]
    pub fn routine_count(&self) -> usize {
        self.routines.len()
    }

    /// Build and encode everything registered so far.
    ///
    /// # Errors
    /// Returns [`Error::EmitFailure`] if `sources` fails, and the first routine-level error
    /// ([`Error::MalformedSequence`], [`Error::OverlappingScope`],
    /// [`Error::UnresolvedCapture`]) in registration order. Nothing is returned on error.
    pub fn emit(self, sources: &dyn SourceProvider) -> Result<DebugInfoStream> {
        let (documents, mut blobs) = self.emit_documents(sources)?;

        if self.options.emit_source_link {
            let json = sources
                .source_link()
                .map_err(|e| Error::EmitFailure(format!("source link: {e}")))?;
            if let Some(json) = json {
                blobs.push(StreamBlob {
                    kind: CustomDebugKind::SourceLink,
                    document: None,
                    data: json.into_bytes(),
                });
            }
        }

        let options = self.options;
        let built: Vec<Result<BuiltRoutine>> = if options.parallel {
            self.routines
                .par_iter()
                .map(|body| build_routine(body, &options))
                .collect()
        } else {
            self.routines
                .iter()
                .map(|body| build_routine(body, &options))
                .collect()
        };
        let built = built.into_iter().collect::<Result<Vec<_>>>()?;

        // Chains first used in this stream. They reach the shared table only once every
        // routine has encoded, so a failed emit never leaves forwards to unpublished owners.
        let mut owned: HashMap<ImportChain, Token> = HashMap::new();
        let mut diagnostics = Diagnostics::new();
        let mut methods = Vec::with_capacity(built.len());
        for (body, routine) in self.routines.into_iter().zip(built) {
            diagnostics.extend(routine.diagnostics);

            let mut cdi = CustomDebugInfo::default();
            let imports = match &routine.imports {
                None => ImportsRecord::None,
                Some(chain) => {
                    match chain_ownership(&self.import_chains, &mut owned, chain, body.token) {
                        ChainOwnership::Owner => {
                            cdi.records
                                .push(CustomDebugRecord::UsingInfo(using_counts(chain)?));
                            ImportsRecord::Chain(encode_import_chain(chain)?)
                        }
                        ChainOwnership::Forward(owner) => {
                            cdi.records.push(CustomDebugRecord::Forward(owner));
                            ImportsRecord::Forward(owner)
                        }
                    }
                }
            };
            if let Some(name) = body.state_machine {
                cdi.records.push(CustomDebugRecord::ForwardIterator(name));
            }
            if !body.hoisted_scopes.is_empty() {
                cdi.records
                    .push(CustomDebugRecord::HoistedLocalScopes(body.hoisted_scopes));
            }
            if let Some(map) = routine.slot_map {
                cdi.records.push(CustomDebugRecord::LocalSlotMap(map));
            }
            if let Some(map) = routine.lambda_map {
                cdi.records.push(CustomDebugRecord::LambdaMap(map));
            }

            log::debug!(
                "emitted {} {}::{} ({} sequence point bytes, {} scope bytes, imports {})",
                body.token,
                body.declaring_type,
                body.name,
                routine.sequence_points.len(),
                routine.scopes.len(),
                imports_summary(&imports)
            );

            methods.push(MethodDebugRecord {
                token: body.token,
                declaring_type: body.declaring_type,
                name: body.name,
                parameters: body.parameters,
                method_ordinal: body.method_ordinal,
                local_signature: body.local_signature,
                starts_hidden: routine.starts_hidden,
                sequence_points: routine.sequence_points,
                scopes: routine.scopes,
                imports,
                custom_debug_info: encode_custom_debug_info(&cdi)?,
            });
        }

        for (chain, owner) in &owned {
            if let ChainOwnership::Forward(existing) = self.import_chains.intern(chain, *owner) {
                log::debug!("{owner} and {existing} both own an identical import chain");
            }
        }

        if diagnostics.has_warnings() {
            log::debug!("{}", diagnostics.summary().trim_end());
        }

        Ok(DebugInfoStream {
            documents,
            methods,
            blobs,
            diagnostics,
        })
    }

    fn emit_documents(
        &self,
        sources: &dyn SourceProvider,
    ) -> Result<(DocumentTable, Vec<StreamBlob>)> {
        let mut table = DocumentTable::new();
        let mut blobs = Vec::new();

        for path in &self.documents {
            let content = sources
                .content(path)
                .map_err(|e| Error::EmitFailure(format!("{path}: {e}")))?;
            let id = table.add(
                path.as_str(),
                content.as_deref(),
                self.options.checksum_algorithm,
            );

            if self.options.embed_sources {
                if let Some(content) = content {
                    blobs.push(StreamBlob {
                        kind: CustomDebugKind::EmbeddedSource,
                        document: Some(id),
                        data: embedded_source_blob(&content),
                    });
                }
            }
        }

        Ok((table, blobs))
    }
}

fn build_routine(body: &RoutineBody, options: &EmitOptions) -> Result<BuiltRoutine> {
    let token = body.token;
    let mut diagnostics = Vec::new();

    let mut points = SequencePointBuilder::new(token, body.initial_document())
        .with_local_signature(body.local_signature);
    if body.has_prologue {
        points = points.with_prologue();
    }
    for mark in &body.marks {
        match mark {
            SequenceMark::Visible { il_offset, span } => points.mark_visible(*il_offset, *span)?,
            SequenceMark::Hidden { il_offset } => points.mark_hidden(*il_offset)?,
        }
    }
    let points = points.build();

    let mut scopes = ScopeTreeBuilder::new(token, body.code_size)
        .with_local_signature(body.local_signature)
        .keep_empty_scopes();
    for event in &body.blocks {
        match event {
            BlockEvent::Enter(offset) => scopes.open_scope(*offset)?,
            BlockEvent::LocalsBucket(offset) => scopes.open_locals_bucket(*offset)?,
            BlockEvent::Exit(offset) => scopes.close_scope(*offset)?,
            BlockEvent::Declare(binding) => scopes.declare_local(binding.clone()),
            BlockEvent::Constant(constant) => scopes.declare_constant(constant.clone()),
        }
    }
    let mut tree = scopes.build()?;
    for local in tree.drop_long_local_names(options.max_local_name_length) {
        diagnostics.push(name_too_long(
            token,
            DiagnosticCategory::Local,
            format!(
                "local #{} name of {} bytes exceeds {} and was omitted",
                local.slot_index,
                local.name.len(),
                options.max_local_name_length
            ),
        ));
    }
    for constant in tree.drop_long_constant_names(options.max_local_name_length) {
        diagnostics.push(name_too_long(
            token,
            DiagnosticCategory::Local,
            format!(
                "constant name of {} bytes exceeds {} and was omitted",
                constant.name.len(),
                options.max_local_name_length
            ),
        ));
    }
    if options.prune_empty_scopes {
        tree.prune_empty();
    }

    let lambda_map = if options.emit_edit_and_continue && body.has_lambdas() {
        let mut builder = LambdaMapBuilder::new(token, body.method_ordinal.unwrap_or_default());
        for closure in &body.closures {
            builder.add_closure(closure.syntax_offset, closure.parent);
        }
        for lambda in &body.lambdas {
            builder.add_lambda(lambda.syntax_offset, lambda.closure);
        }
        Some(builder.build()?)
    } else {
        None
    };

    let slot_map = (options.emit_edit_and_continue && !body.slots.is_empty()).then(|| {
        LocalSlotMap {
            slots: body.slots.clone(),
        }
    });

    let imports = if body.imports.is_empty() {
        None
    } else {
        let mut chain = body.imports.clone();
        for import in chain.drop_long_imports(options.max_import_name_length) {
            diagnostics.push(name_too_long(
                token,
                DiagnosticCategory::Import,
                format!(
                    "import of {} bytes exceeds {} and was omitted: {}...",
                    import.len(),
                    options.max_import_name_length,
                    import.chars().take(32).collect::<String>()
                ),
            ));
        }
        chain.canonicalize();
        Some(chain)
    };

    Ok(BuiltRoutine {
        sequence_points: encode_sequence_points(&points)?,
        starts_hidden: points.starts_hidden(),
        scopes: encode_scopes(&tree)?,
        imports,
        slot_map,
        lambda_map,
        diagnostics,
    })
}

/// Decide whether `token` carries `chain` or forwards to an earlier owner, looking at the
/// shared table and at the chains this stream owns so far.
fn chain_ownership(
    table: &ImportChainTable,
    owned: &mut HashMap<ImportChain, Token>,
    chain: &ImportChain,
    token: Token,
) -> ChainOwnership {
    match table.owner_of(chain).or_else(|| owned.get(chain).copied()) {
        Some(owner) if owner != token => ChainOwnership::Forward(owner),
        _ => {
            owned.entry(chain.clone()).or_insert(token);
            ChainOwnership::Owner
        }
    }
}

fn name_too_long(token: Token, category: DiagnosticCategory, message: String) -> Diagnostic {
    log::warn!("{token}: {message}");
    Diagnostic::warning(category, message).with_token(token)
}

fn using_counts(chain: &ImportChain) -> Result<Vec<u16>> {
    chain
        .levels
        .iter()
        .map(|level| {
            u16::try_from(level.len()).map_err(|_| Error::ValueOutOfRange(level.len() as i64))
        })
        .collect()
}

fn imports_summary(imports: &ImportsRecord) -> String {
    match imports {
        ImportsRecord::None => "none".to_string(),
        ImportsRecord::Chain(blob) => format!("{} bytes", blob.len()),
        ImportsRecord::Forward(owner) => format!("forward to {owner}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        debuginfo::{
            customdebuginformation::{parse_custom_debug_info, HoistedLocalScope},
            importscope::{parse_import_chain, ImportItem, ImportLevel},
            lambdamap::LambdaClosure,
            scope::{parse_scopes, ConstantValue, LocalBinding, LocalConstant},
            sequencepoints::parse_sequence_points,
            slotmap::{LocalSlot, SynthesizedLocalKind},
            span::SourceSpan,
        },
        emit::stream::{MemorySources, NoSources},
        test::{simple_routine as routine, system_imports as system},
    };

    struct FailingSources;

    impl SourceProvider for FailingSources {
        fn content(&self, path: &str) -> Result<Option<Vec<u8>>> {
            Err(Error::Error(format!("cannot read {path}")))
        }
    }

    #[test]
    fn forwarding_by_structure() {
        let mut emitter = Emitter::new(EmitOptions::default());
        emitter.add_document("a.cs");
        emitter.add_routine(routine(1).with_imports(system())).unwrap();
        emitter.add_routine(routine(2)).unwrap();
        emitter.add_routine(routine(3).with_imports(system())).unwrap();

        let stream = emitter.emit(&NoSources).unwrap();

        let first = &stream.methods[0];
        let ImportsRecord::Chain(blob) = &first.imports else {
            panic!("first routine must own the chain");
        };
        assert_eq!(parse_import_chain(blob).unwrap(), system());
        assert_eq!(
            parse_custom_debug_info(&first.custom_debug_info)
                .unwrap()
                .using_counts(),
            Some(&[1_u16][..])
        );

        assert_eq!(stream.methods[1].imports, ImportsRecord::None);
        assert!(stream.methods[1].custom_debug_info.is_empty());

        assert_eq!(
            stream.methods[2].imports,
            ImportsRecord::Forward(Token::method_def(1))
        );
        assert_eq!(
            parse_custom_debug_info(&stream.methods[2].custom_debug_info)
                .unwrap()
                .forward(),
            Some(Token::method_def(1))
        );
    }

    #[test]
    fn ordinals_only_for_lambdas() {
        let mut emitter = Emitter::new(EmitOptions::default());
        emitter.add_routine(routine(1)).unwrap();
        emitter
            .add_routine(routine(2).lambda(0, LambdaClosure::Static))
            .unwrap();
        emitter
            .add_routine(routine(3).lambda(0, LambdaClosure::Static))
            .unwrap();

        let stream = emitter.emit(&NoSources).unwrap();
        assert_eq!(stream.methods[0].method_ordinal, None);
        assert_eq!(stream.methods[1].method_ordinal, Some(0));
        assert_eq!(stream.methods[2].method_ordinal, Some(1));

        let cdi = parse_custom_debug_info(&stream.methods[2].custom_debug_info).unwrap();
        assert_eq!(cdi.lambda_map().map(|map| map.method_ordinal), Some(1));
    }

    #[test]
    fn long_names_become_warnings() {
        let long = "x".repeat(40);
        let mut emitter = Emitter::new(EmitOptions {
            max_import_name_length: 16,
            max_local_name_length: 16,
            ..EmitOptions::default()
        });
        emitter
            .add_routine(
                routine(1)
                    .enter(0)
                    .declare(LocalBinding::new(long.clone(), 0))
                    .declare(LocalBinding::new("ok", 1))
                    .exit(8)
                    .with_imports(ImportChain::new(vec![ImportLevel::new(vec![
                        ImportItem::namespace(long),
                        ImportItem::namespace("System"),
                    ])])),
            )
            .unwrap();

        let stream = emitter.emit(&NoSources).unwrap();
        assert_eq!(stream.diagnostics.count(), 2);
        assert_eq!(stream.diagnostics.by_category(DiagnosticCategory::Local).len(), 1);
        assert_eq!(stream.diagnostics.by_category(DiagnosticCategory::Import).len(), 1);

        let method = &stream.methods[0];
        let tree = parse_scopes(&method.scopes).unwrap();
        let names: Vec<_> = tree
            .iter()
            .flat_map(|(_, scope)| scope.locals.iter().map(|l| l.name.clone()))
            .collect();
        assert_eq!(names, ["ok"]);

        let ImportsRecord::Chain(blob) = &method.imports else {
            panic!("routine must own its chain");
        };
        assert_eq!(parse_import_chain(blob).unwrap().using_counts(), [1]);
    }

    #[test]
    fn long_constant_names_dropped() {
        let mut emitter = Emitter::new(EmitOptions {
            max_local_name_length: 8,
            ..EmitOptions::default()
        });
        emitter
            .add_routine(
                routine(1)
                    .enter(0)
                    .constant(LocalConstant::new("VeryLongName", ConstantValue::I4(1), "Int32"))
                    .exit(8),
            )
            .unwrap();

        let stream = emitter.emit(&NoSources).unwrap();
        assert_eq!(stream.diagnostics.by_category(DiagnosticCategory::Local).len(), 1);
        let tree = parse_scopes(&stream.methods[0].scopes).unwrap();
        assert!(tree.iter().all(|(_, scope)| scope.constants.is_empty()));
    }

    #[test]
    fn state_machine_records() {
        let mut emitter = Emitter::new(EmitOptions::default());
        emitter
            .add_routine(
                routine(1)
                    .with_imports(system())
                    .with_state_machine("<M1>d__0")
                    .hoisted_scope(HoistedLocalScope::new(2, 6))
                    .lambda(0, LambdaClosure::Static),
            )
            .unwrap();

        let stream = emitter.emit(&NoSources).unwrap();
        let cdi = parse_custom_debug_info(&stream.methods[0].custom_debug_info).unwrap();
        let kinds: Vec<u8> = cdi.records.iter().map(CustomDebugRecord::kind).collect();
        assert_eq!(kinds, [0, 4, 3, 7]);
        assert_eq!(cdi.forward_iterator(), Some("<M1>d__0"));
        assert_eq!(
            cdi.hoisted_local_scopes(),
            Some(&[HoistedLocalScope::new(2, 6)][..])
        );
    }

    #[test]
    fn routine_error_aborts() {
        let mut emitter = Emitter::new(EmitOptions::default());
        emitter.add_routine(routine(1)).unwrap();
        emitter.add_routine(routine(2).enter(0)).unwrap();

        assert!(matches!(
            emitter.emit(&NoSources),
            Err(Error::OverlappingScope { token, .. }) if token == Token::method_def(2)
        ));
    }

    #[test]
    fn provider_failure_aborts() {
        let mut emitter = Emitter::new(EmitOptions::default());
        emitter.add_document("a.cs");
        emitter.add_routine(routine(1)).unwrap();

        assert!(matches!(
            emitter.emit(&FailingSources),
            Err(Error::EmitFailure(_))
        ));
    }

    #[test]
    fn documents_and_blobs() {
        let mut emitter = Emitter::new(EmitOptions::portable());
        assert_eq!(emitter.add_document("a.cs"), 1);
        assert_eq!(emitter.add_document("b.cs"), 2);
        assert_eq!(emitter.add_document("a.cs"), 1);

        let sources = MemorySources::new()
            .with_file("a.cs", "class A {}")
            .with_source_link(r#"{"documents":{}}"#);
        let stream = emitter.emit(&sources).unwrap();

        assert_eq!(stream.documents.len(), 2);
        assert_eq!(stream.documents.get(1).map(|d| d.checksum.len()), Some(20));
        assert!(stream.documents.get(2).is_some_and(|d| d.checksum.is_empty()));
        assert_eq!(stream.embedded_source(1), Some(&b"class A {}"[..]));
        assert_eq!(stream.embedded_source(2), None);
        assert_eq!(stream.source_link(), Some(&br#"{"documents":{}}"#[..]));
    }

    #[test]
    fn minimal_skips_edit_and_continue() {
        let mut emitter = Emitter::new(EmitOptions::minimal());
        emitter
            .add_routine(
                routine(1)
                    .closure(0, None)
                    .lambda(4, LambdaClosure::Closure(0))
                    .slot(LocalSlot::new(SynthesizedLocalKind::LambdaDisplayClass, 0)),
            )
            .unwrap();

        let stream = emitter.emit(&NoSources).unwrap();
        assert!(stream.methods[0].custom_debug_info.is_empty());
    }

    #[test]
    fn prologue_and_points() {
        let mut emitter = Emitter::new(EmitOptions::default());
        emitter
            .add_routine(routine(1).with_prologue().mark(2, SourceSpan::on_line(1, 2, 1, 4)))
            .unwrap();

        let stream = emitter.emit(&NoSources).unwrap();
        let method = &stream.methods[0];
        assert!(method.starts_hidden);

        let points = parse_sequence_points(&method.sequence_points).unwrap();
        assert_eq!(points.len(), 2);
        assert!(points.points[0].is_hidden());
    }
}
