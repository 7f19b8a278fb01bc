//! Decoding a stream back into symbols and rendering the `<symbols>` dump.

use crate::{
    debuginfo::{
        customdebuginformation::{parse_custom_debug_info, CustomDebugInfo, CustomDebugRecord},
        document::{ChecksumAlgorithm, Document, CSHARP_LANGUAGE},
        importscope::{parse_import_chain, ImportChain, ImportItem},
        lambdamap::{LambdaClosure, LambdaMap},
        scope::{parse_scopes, Scope, ScopeKind, ScopeTree},
        sequencepoints::{parse_sequence_points, SequencePoint, SequencePoints},
        slotmap::{LocalSlotMap, SlotKind},
        token::Token,
    },
    emit::{DebugInfoStream, ImportsRecord, MethodDebugRecord},
    verify::xml::XmlNode,
    Result,
};

/// Import information of a decoded routine.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum MethodImports {
    /// No imports
    #[default]
    None,
    /// The routine carries this chain
    Chain(ImportChain),
    /// The routine uses the chain of another routine
    Forward(Token),
}

/// Everything decoded for one routine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MethodSymbols {
    /// `MethodDef` token
    pub token: Token,
    /// Full name of the declaring type
    pub declaring_type: String,
    /// Routine name
    pub name: String,
    /// Parameter names
    pub parameters: Vec<String>,
    /// Decoded sequence points
    pub sequence_points: SequencePoints,
    /// Decoded scope tree
    pub scopes: ScopeTree,
    /// Decoded imports
    pub imports: MethodImports,
    /// Decoded custom debug information
    pub custom_debug_info: CustomDebugInfo,
}

/// A document together with the size of its embedded content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentSymbols {
    /// The document
    pub document: Document,
    /// Length of the embedded content, if any
    pub embedded_length: Option<usize>,
}

/// The decoded content of a [`DebugInfoStream`].
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Symbols {
    /// Documents in id order
    pub documents: Vec<DocumentSymbols>,
    /// Routines in stream order
    pub methods: Vec<MethodSymbols>,
}

/// Decodes every blob of a [`DebugInfoStream`] independently.
///
/// # Examples
///
/// ```rust
/// use symscope::prelude::*;
///
/// let mut emitter = Emitter::new(EmitOptions::default());
/// let doc = emitter.add_document("a.cs");
/// emitter.add_routine(
///     RoutineBody::new(Token::method_def(1), "C", "M", 2).mark(0, SourceSpan::on_line(doc, 5, 5, 6)),
/// )?;
/// let stream = emitter.emit(&NoSources)?;
///
/// let symbols = SymbolReader::new(&stream).read()?;
/// let xml = symbols.method_xml(Token::method_def(1))?;
/// assert!(xml.contains(r#"<entry offset="0x0" startLine="5" startColumn="5" endLine="5" endColumn="6" document="1"/>"#));
/// # Ok::<(), symscope::Error>(())
/// ```
pub struct SymbolReader<'a> {
    stream: &'a DebugInfoStream,
}

impl<'a> SymbolReader<'a> {
    /// Create a reader over `stream`.
    #[must_use]
    pub fn new(stream: &'a DebugInfoStream) -> Self {
        SymbolReader { stream }
    }

    /// Decode the whole stream.
    ///
    /// # Errors
    /// Returns [`crate::Error::Malformed`] or [`crate::Error::OutOfBounds`] for a damaged
    /// blob, or if the using counts disagree with the import chain.
    pub fn read(&self) -> Result<Symbols> {
        let documents = self
            .stream
            .documents
            .iter()
            .map(|document| DocumentSymbols {
                document: document.clone(),
                embedded_length: self.stream.embedded_source(document.id).map(<[u8]>::len),
            })
            .collect();

        let methods = self
            .stream
            .methods
            .iter()
            .map(Self::read_method)
            .collect::<Result<Vec<_>>>()?;

        Ok(Symbols { documents, methods })
    }

    /// Decode one routine record.
    ///
    /// # Errors
    /// See [`SymbolReader::read`].
    pub fn read_method(record: &MethodDebugRecord) -> Result<MethodSymbols> {
        let custom_debug_info = parse_custom_debug_info(&record.custom_debug_info)?;
        let imports = match &record.imports {
            ImportsRecord::None => MethodImports::None,
            ImportsRecord::Forward(owner) => MethodImports::Forward(*owner),
            ImportsRecord::Chain(blob) => {
                let chain = parse_import_chain(blob)?;
                if let Some(counts) = custom_debug_info.using_counts() {
                    let expected: Vec<usize> = counts.iter().map(|c| usize::from(*c)).collect();
                    if expected != chain.using_counts() {
                        return Err(malformed_error!(
                            "Using counts {:?} of {} disagree with its import chain {:?}",
                            expected,
                            record.token,
                            chain.using_counts()
                        ));
                    }
                }
                MethodImports::Chain(chain)
            }
        };

        Ok(MethodSymbols {
            token: record.token,
            declaring_type: record.declaring_type.clone(),
            name: record.name.clone(),
            parameters: record.parameters.clone(),
            sequence_points: parse_sequence_points(&record.sequence_points)?,
            scopes: parse_scopes(&record.scopes)?,
            imports,
            custom_debug_info,
        })
    }

    /// Decode the stream and render it as XML.
    ///
    /// # Errors
    /// See [`SymbolReader::read`] and [`Symbols::to_xml`].
    pub fn to_xml(&self) -> Result<String> {
        self.read()?.to_xml()
    }
}

impl Symbols {
    /// The decoded routine `token`.
    #[must_use]
    pub fn method(&self, token: Token) -> Option<&MethodSymbols> {
        self.methods.iter().find(|method| method.token == token)
    }

    /// The import chain in effect for routine `token`, following forwards to the routine
    /// that carries it.
    ///
    /// Returns `None` if the routine has no imports, is not in the stream, or forwards to a
    /// routine outside the stream.
    #[must_use]
    pub fn resolve_imports(&self, token: Token) -> Option<&ImportChain> {
        let mut current = token;
        for _ in 0..=self.methods.len() {
            match &self.method(current)?.imports {
                MethodImports::None => return None,
                MethodImports::Chain(chain) => return Some(chain),
                MethodImports::Forward(owner) => current = *owner,
            }
        }
        None
    }

    /// Render every document and routine.
    ///
    /// # Errors
    /// Returns [`crate::Error::Error`] if the XML writer fails.
    pub fn to_xml(&self) -> Result<String> {
        let mut files = XmlNode::new("files");
        for document in &self.documents {
            files.push(render_document(document));
        }

        let mut methods = XmlNode::new("methods");
        for method in &self.methods {
            methods.push(self.render_method(method));
        }

        XmlNode::new("symbols")
            .child(files)
            .child(methods)
            .to_xml_string()
    }

    /// Render a single routine inside `<symbols><methods>`.
    ///
    /// # Errors
    /// Returns [`crate::Error::Error`] if `token` is not in the stream or the writer fails.
    pub fn method_xml(&self, token: Token) -> Result<String> {
        let method = self
            .method(token)
            .ok_or_else(|| crate::Error::Error(format!("no routine {token} in stream")))?;

        XmlNode::new("symbols")
            .child(XmlNode::new("methods").child(self.render_method(method)))
            .to_xml_string()
    }

    fn render_method(&self, method: &MethodSymbols) -> XmlNode {
        let mut node = XmlNode::new("method")
            .attr("containingType", &method.declaring_type)
            .attr("name", &method.name);
        if !method.parameters.is_empty() {
            node = node.attr("parameterNames", method.parameters.join(", "));
        }

        if !method.custom_debug_info.is_empty() {
            node.push(self.render_custom_debug_info(method));
        }
        if !method.sequence_points.is_empty() {
            node.push(render_sequence_points(&method.sequence_points));
        }

        let imports = match &method.imports {
            MethodImports::Chain(chain) => chain.items().map(render_import).collect(),
            _ => Vec::new(),
        };
        node.push(render_scope(&method.scopes.root, imports));
        node
    }

    fn render_custom_debug_info(&self, method: &MethodSymbols) -> XmlNode {
        let mut node = XmlNode::new("customDebugInfo");
        for record in &method.custom_debug_info.records {
            node.push(match record {
                CustomDebugRecord::UsingInfo(counts) => {
                    let mut using = XmlNode::new("using");
                    for count in counts {
                        using.push(XmlNode::new("namespace").attr("usingCount", count));
                    }
                    using
                }
                CustomDebugRecord::Forward(owner) => self.render_forward("forward", *owner),
                CustomDebugRecord::ForwardToModule(owner) => {
                    self.render_forward("forwardToModule", *owner)
                }
                CustomDebugRecord::HoistedLocalScopes(scopes) => {
                    let mut hoisted = XmlNode::new("hoistedLocalScopes");
                    for scope in scopes {
                        hoisted.push(
                            XmlNode::new("slot")
                                .attr("startOffset", format!("{:#x}", scope.start_offset))
                                .attr("endOffset", format!("{:#x}", scope.end_offset)),
                        );
                    }
                    hoisted
                }
                CustomDebugRecord::ForwardIterator(name) => {
                    XmlNode::new("forwardIterator").attr("name", name)
                }
                CustomDebugRecord::LocalSlotMap(map) => render_slot_map(map),
                CustomDebugRecord::LambdaMap(map) => render_lambda_map(map),
                CustomDebugRecord::Unknown { kind, data } => XmlNode::new("unknown")
                    .attr("kind", kind)
                    .attr("size", data.len()),
            });
        }
        node
    }

    fn render_forward(&self, name: &str, owner: Token) -> XmlNode {
        match self.method(owner) {
            Some(target) => XmlNode::new(name)
                .attr("declaringType", &target.declaring_type)
                .attr("methodName", &target.name),
            None => XmlNode::new(name).attr("token", owner),
        }
    }
}

fn render_document(symbols: &DocumentSymbols) -> XmlNode {
    let document = &symbols.document;
    let language = if document.language == CSHARP_LANGUAGE {
        "C#".to_string()
    } else {
        document.language.to_string()
    };

    let mut node = XmlNode::new("file")
        .attr("id", document.id)
        .attr("name", &document.path)
        .attr("language", language);
    if !document.checksum.is_empty() {
        let algorithm = match document.algorithm() {
            Some(ChecksumAlgorithm::Sha1) => "SHA1".to_string(),
            Some(ChecksumAlgorithm::Md5) => "MD5".to_string(),
            None => document.hash_algorithm.to_string(),
        };
        let checksum: Vec<String> = document
            .checksum
            .iter()
            .map(|b| format!("{b:02X}"))
            .collect();
        node = node
            .attr("checksumAlgorithm", algorithm)
            .attr("checksum", checksum.join("-"));
    }
    if let Some(length) = symbols.embedded_length {
        node = node.attr("embeddedSourceLength", length);
    }
    node
}

fn render_sequence_points(points: &SequencePoints) -> XmlNode {
    let mut node = XmlNode::new("sequencePoints");
    for point in points {
        node.push(match point {
            SequencePoint::Visible { il_offset, span } => XmlNode::new("entry")
                .attr("offset", format!("{il_offset:#x}"))
                .attr("startLine", span.start_line)
                .attr("startColumn", span.start_column)
                .attr("endLine", span.end_line)
                .attr("endColumn", span.end_column)
                .attr("document", span.document),
            SequencePoint::Hidden {
                il_offset,
                document,
            } => XmlNode::new("entry")
                .attr("offset", format!("{il_offset:#x}"))
                .attr("hidden", "true")
                .attr("document", document),
        });
    }
    node
}

fn render_scope(scope: &Scope, imports: Vec<XmlNode>) -> XmlNode {
    let mut node = XmlNode::new("scope")
        .attr("startOffset", format!("{:#x}", scope.start_offset))
        .attr("endOffset", format!("{:#x}", scope.end_offset));
    if scope.kind == ScopeKind::LocalsBucket {
        node = node.attr("kind", "localsBucket");
    }

    node.children = imports;
    for local in &scope.locals {
        node.push(
            XmlNode::new("local")
                .attr("name", &local.name)
                .attr("il_index", local.slot_index)
                .attr("il_start", format!("{:#x}", scope.start_offset))
                .attr("il_end", format!("{:#x}", scope.end_offset))
                .attr("attributes", local.attributes.bits()),
        );
    }
    for constant in &scope.constants {
        let entry = XmlNode::new("constant")
            .attr("name", &constant.name)
            .attr("value", constant.value.to_string());
        node.push(if constant.has_primitive_type() {
            entry.attr("type", &constant.type_name)
        } else {
            entry.attr("signature", &constant.type_name)
        });
    }
    for child in &scope.children {
        node.push(render_scope(child, Vec::new()));
    }
    node
}

fn render_import(item: &ImportItem) -> XmlNode {
    match item {
        ImportItem::Namespace { namespace } => XmlNode::new("namespace").attr("name", namespace),
        ImportItem::NamespaceAlias { alias, namespace } => XmlNode::new("alias")
            .attr("name", alias)
            .attr("target", namespace)
            .attr("kind", "namespace"),
        ImportItem::TypeAlias { alias, type_name } => XmlNode::new("alias")
            .attr("name", alias)
            .attr("target", type_name)
            .attr("kind", "type"),
        ImportItem::Type { type_name } => XmlNode::new("type").attr("name", type_name),
        ImportItem::ExternAlias { alias } => XmlNode::new("extern").attr("alias", alias),
        ImportItem::ExternInfo { alias, assembly } => XmlNode::new("externinfo")
            .attr("alias", alias)
            .attr("assembly", assembly),
    }
}

fn render_slot_map(map: &LocalSlotMap) -> XmlNode {
    let mut node = XmlNode::new("encLocalSlotMap");
    for slot in &map.slots {
        node.push(match slot.kind {
            SlotKind::Temp => XmlNode::new("slot").attr("kind", "temp"),
            SlotKind::LongLived(kind) => {
                let mut entry = XmlNode::new("slot")
                    .attr("kind", kind)
                    .attr("offset", slot.syntax_offset);
                if slot.ordinal > 0 {
                    entry = entry.attr("ordinal", slot.ordinal);
                }
                entry
            }
        });
    }
    node
}

fn render_lambda_map(map: &LambdaMap) -> XmlNode {
    let mut node = XmlNode::new("encLambdaMap")
        .child(XmlNode::new("methodOrdinal").text(map.method_ordinal.to_string()));

    for closure in &map.closures {
        let mut entry = XmlNode::new("closure").attr("offset", closure.syntax_offset);
        if let Some(parent) = closure.parent {
            entry = entry.attr("parent", parent);
        }
        node.push(entry);
    }
    for lambda in &map.lambdas {
        let entry = XmlNode::new("lambda").attr("offset", lambda.syntax_offset);
        node.push(match lambda.closure {
            LambdaClosure::Static => entry,
            LambdaClosure::ThisOnly => entry.attr("closure", "this"),
            LambdaClosure::Closure(index) => entry.attr("closure", index),
        });
    }
    node
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        debuginfo::{
            customdebuginformation::HoistedLocalScope,
            importscope::ImportLevel,
            scope::{ConstantValue, LocalBinding, LocalConstant},
            slotmap::{LocalSlot, SynthesizedLocalKind},
            span::SourceSpan,
        },
        emit::{EmitOptions, Emitter, MemorySources, RoutineBody},
        test::emit_routines as emit,
        verify::diff::assert_symbols_eq,
    };

    #[test]
    fn lambda_and_slot_map() {
        let stream = emit(vec![RoutineBody::new(Token::method_def(1), "C", "F", 0x20)
            .with_parameters(["a"])
            .mark(0, SourceSpan::on_line(1, 5, 5, 6))
            .mark_hidden(0x10)
            .enter(0)
            .declare(LocalBinding::new("CS$<>8__locals0", 0))
            .exit(0x20)
            .closure(0, None)
            .lambda(22, LambdaClosure::Closure(0))
            .lambda(40, LambdaClosure::Static)
            .lambda(60, LambdaClosure::ThisOnly)
            .slot(LocalSlot::new(SynthesizedLocalKind::LambdaDisplayClass, 0))
            .slot(LocalSlot::temp())]);

        let symbols = SymbolReader::new(&stream).read().unwrap();
        assert_symbols_eq(
            r#"
<symbols>
  <methods>
    <method containingType="C" name="F" parameterNames="a">
      <customDebugInfo>
        <encLocalSlotMap>
          <slot kind="30" offset="0"/>
          <slot kind="temp"/>
        </encLocalSlotMap>
        <encLambdaMap>
          <methodOrdinal>0</methodOrdinal>
          <closure offset="0"/>
          <lambda offset="22" closure="0"/>
          <lambda offset="40"/>
          <lambda offset="60" closure="this"/>
        </encLambdaMap>
      </customDebugInfo>
      <sequencePoints>
        <entry offset="0x0" startLine="5" startColumn="5" endLine="5" endColumn="6" document="1"/>
        <entry offset="0x10" hidden="true" document="1"/>
      </sequencePoints>
      <scope startOffset="0x0" endOffset="0x20">
        <scope startOffset="0x0" endOffset="0x20">
          <local name="CS$&lt;&gt;8__locals0" il_index="0" il_start="0x0" il_end="0x20" attributes="0"/>
        </scope>
      </scope>
    </method>
  </methods>
</symbols>"#,
            &symbols.method_xml(Token::method_def(1)).unwrap(),
        );
    }

    #[test]
    fn constants_and_state_machine() {
        let stream = emit(vec![
            RoutineBody::new(Token::method_def(1), "C", "Items", 0x10)
                .with_state_machine("<Items>d__0"),
            RoutineBody::new(Token::method_def(2), "C+<Items>d__0", "MoveNext", 0x40)
                .hoisted_scope(HoistedLocalScope::new(0x0E, 0x3A))
                .hoisted_scope(HoistedLocalScope::default())
                .constant(LocalConstant::new("Limit", ConstantValue::I4(10), "Int32"))
                .enter(0x08)
                .declare(LocalBinding::new("x", 0))
                .constant(LocalConstant::new("Name", ConstantValue::String("n".into()), "String"))
                .constant(LocalConstant::new("Callback", ConstantValue::Null, "System.Action"))
                .exit(0x30),
        ]);

        let symbols = SymbolReader::new(&stream).read().unwrap();
        assert_symbols_eq(
            r#"
<symbols>
  <files>
    <file id="1" name="a.cs" language="C#"/>
  </files>
  <methods>
    <method containingType="C" name="Items">
      <customDebugInfo>
        <forwardIterator name="&lt;Items&gt;d__0"/>
      </customDebugInfo>
      <scope startOffset="0x0" endOffset="0x10"/>
    </method>
    <method containingType="C+&lt;Items&gt;d__0" name="MoveNext">
      <customDebugInfo>
        <hoistedLocalScopes>
          <slot startOffset="0xe" endOffset="0x3a"/>
          <slot startOffset="0x0" endOffset="0x0"/>
        </hoistedLocalScopes>
      </customDebugInfo>
      <scope startOffset="0x0" endOffset="0x40">
        <constant name="Limit" value="10" type="Int32"/>
        <scope startOffset="0x8" endOffset="0x30">
          <local name="x" il_index="0" il_start="0x8" il_end="0x30" attributes="0"/>
          <constant name="Name" value="n" type="String"/>
          <constant name="Callback" value="null" signature="System.Action"/>
        </scope>
      </scope>
    </method>
  </methods>
</symbols>"#,
            &symbols.to_xml().unwrap(),
        );
    }

    #[test]
    fn resolve_follows_forwards() {
        let chain = ImportChain::new(vec![ImportLevel::new(vec![ImportItem::namespace("System")])]);
        let stream = emit(vec![
            RoutineBody::new(Token::method_def(1), "C", "A", 1).with_imports(chain.clone()),
            RoutineBody::new(Token::method_def(2), "C", "B", 1).with_imports(chain.clone()),
            RoutineBody::new(Token::method_def(3), "C", "D", 1),
        ]);

        let mut symbols = SymbolReader::new(&stream).read().unwrap();
        assert_eq!(symbols.resolve_imports(Token::method_def(2)), Some(&chain));
        assert_eq!(symbols.resolve_imports(Token::method_def(3)), None);
        assert_eq!(symbols.resolve_imports(Token::method_def(9)), None);

        // a forward cycle terminates
        symbols.methods[0].imports = MethodImports::Forward(Token::method_def(2));
        assert_eq!(symbols.resolve_imports(Token::method_def(2)), None);
    }

    #[test]
    fn imports_and_forward() {
        let chain = ImportChain::new(vec![
            ImportLevel::new(vec![ImportItem::namespace_alias("IO", "System.IO")]),
            ImportLevel::new(vec![
                ImportItem::namespace("System"),
                ImportItem::extern_alias("P"),
            ]),
        ]);
        let stream = emit(vec![
            RoutineBody::new(Token::method_def(1), "N.C", "A", 1).with_imports(chain.clone()),
            RoutineBody::new(Token::method_def(2), "N.C", "B", 1).with_imports(chain),
        ]);

        let symbols = SymbolReader::new(&stream).read().unwrap();
        assert_symbols_eq(
            r#"
<symbols>
  <methods>
    <method containingType="N.C" name="A">
      <customDebugInfo>
        <using>
          <namespace usingCount="1"/>
          <namespace usingCount="2"/>
        </using>
      </customDebugInfo>
      <scope startOffset="0x0" endOffset="0x1">
        <alias name="IO" target="System.IO" kind="namespace"/>
        <extern alias="P"/>
        <namespace name="System"/>
      </scope>
    </method>
  </methods>
</symbols>"#,
            &symbols.method_xml(Token::method_def(1)).unwrap(),
        );
        assert_symbols_eq(
            r#"
<symbols>
  <methods>
    <method containingType="N.C" name="B">
      <customDebugInfo>
        <forward declaringType="N.C" methodName="A"/>
      </customDebugInfo>
      <scope startOffset="0x0" endOffset="0x1"/>
    </method>
  </methods>
</symbols>"#,
            &symbols.method_xml(Token::method_def(2)).unwrap(),
        );
    }

    #[test]
    fn files() {
        let mut emitter = Emitter::new(EmitOptions::portable());
        emitter.add_document("a.cs");
        emitter.add_document("b.cs");
        let stream = emitter
            .emit(&MemorySources::new().with_file("a.cs", "abc"))
            .unwrap();

        let xml = SymbolReader::new(&stream).to_xml().unwrap();
        assert_symbols_eq(
            r#"
<symbols>
  <files>
    <file id="1" name="a.cs" language="C#" checksumAlgorithm="SHA1"
          checksum="A9-99-3E-36-47-06-81-6A-BA-3E-25-71-78-50-C2-6C-9C-D0-D8-9D"
          embeddedSourceLength="3"/>
    <file id="2" name="b.cs" language="C#"/>
  </files>
  <methods/>
</symbols>"#,
            &xml,
        );
    }

    #[test]
    fn using_count_mismatch() {
        let mut stream = emit(vec![RoutineBody::new(Token::method_def(1), "C", "M", 1)
            .with_imports(ImportChain::new(vec![ImportLevel::new(vec![
                ImportItem::namespace("System"),
            ])]))]);
        stream.methods[0].custom_debug_info =
            crate::debuginfo::customdebuginformation::encode_custom_debug_info(
                &CustomDebugInfo {
                    records: vec![CustomDebugRecord::UsingInfo(vec![2])],
                },
            )
            .unwrap();

        assert!(SymbolReader::new(&stream).read().is_err());
    }
}
