//! Symbol graph: containers, declarations, and call sites.
//!
//! The graph is the engine's view of a parsed program: classes and modules
//! (containers) connected by inheritance and mixin-inclusion edges, method
//! declarations owned by containers, and call sites with receivers. It is
//! fed by an external parser through [`GraphBuilder`] and frozen into an
//! immutable [`SymbolGraph`] snapshot by [`GraphBuilder::build`], which also
//! precomputes every container's method resolution order (see [`crate::mro`]).
//!
//! Validation is eager: structural errors (unknown ids, include cycles,
//! duplicate declarations) are rejected at insertion time, so a built graph
//! is always well-formed. A rename never mutates the graph; it produces a
//! fresh edit set.

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use mixtool_core::patch::{FileId, Span};

use crate::mro::{linearize, MroEntry};

// ============================================================================
// ID Types
// ============================================================================

/// Unique identifier for a container (class or module) within a snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, PartialOrd, Ord)]
pub struct ContainerId(pub u32);

impl ContainerId {
    /// Create a new container ID.
    pub fn new(id: u32) -> Self {
        ContainerId(id)
    }
}

impl fmt::Display for ContainerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "cont_{}", self.0)
    }
}

/// Unique identifier for a method declaration within a snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, PartialOrd, Ord)]
pub struct DeclId(pub u32);

impl DeclId {
    /// Create a new declaration ID.
    pub fn new(id: u32) -> Self {
        DeclId(id)
    }
}

impl fmt::Display for DeclId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "decl_{}", self.0)
    }
}

/// Unique identifier for a call site within a snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, PartialOrd, Ord)]
pub struct CallSiteId(pub u32);

impl CallSiteId {
    /// Create a new call site ID.
    pub fn new(id: u32) -> Self {
        CallSiteId(id)
    }
}

impl fmt::Display for CallSiteId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "call_{}", self.0)
    }
}

// ============================================================================
// Enums
// ============================================================================

/// Kind of container.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContainerKind {
    /// A class: may have a superclass, may include modules.
    Class,
    /// A module (mixin): may include modules, never has a superclass.
    Module,
}

/// Method arity, as the dispatcher sees it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Arity {
    /// Exactly `n` arguments.
    Fixed(u32),
    /// `n` or more arguments (optional or rest parameters).
    AtLeast(u32),
}

impl Arity {
    /// Whether a call with `argc` arguments can dispatch to this arity.
    pub fn accepts(&self, argc: u32) -> bool {
        match self {
            Arity::Fixed(n) => argc == *n,
            Arity::AtLeast(n) => argc >= *n,
        }
    }

    /// Whether two arities can both accept some argument count.
    ///
    /// Overlapping arities are conflatable by dispatch; non-overlapping
    /// arities are distinct overloads.
    pub fn overlaps(&self, other: &Arity) -> bool {
        match (self, other) {
            (Arity::Fixed(a), Arity::Fixed(b)) => a == b,
            (Arity::Fixed(a), Arity::AtLeast(n)) | (Arity::AtLeast(n), Arity::Fixed(a)) => a >= n,
            (Arity::AtLeast(_), Arity::AtLeast(_)) => true,
        }
    }
}

impl fmt::Display for Arity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Arity::Fixed(n) => write!(f, "{}", n),
            Arity::AtLeast(n) => write!(f, ">={}", n),
        }
    }
}

/// The receiver of a method call, as far as the external analysis can tell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Receiver {
    /// Receiver is an instance of a statically known container
    /// (e.g. a literal constructor call like `E.new`).
    Instance(ContainerId),
    /// Receiver type is unknown (duck-typed call).
    Unknown,
}

// ============================================================================
// Tables
// ============================================================================

/// A source file registered with the graph.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceFile {
    /// File ID (stable within the snapshot).
    pub file_id: FileId,
    /// Workspace-relative path.
    pub path: String,
}

/// A class or module.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Container {
    /// Container ID (stable within the snapshot).
    pub container_id: ContainerId,
    /// Container name.
    pub name: String,
    /// Class or module.
    pub kind: ContainerKind,
    /// Superclass (classes only).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub superclass: Option<ContainerId>,
    /// Included modules in inclusion order; the last entry is the most
    /// recent inclusion and shadows earlier ones.
    pub includes: Vec<ContainerId>,
}

/// A named method declaration on a container.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Declaration {
    /// Declaration ID (stable within the snapshot).
    pub decl_id: DeclId,
    /// Owning container.
    pub owner: ContainerId,
    /// Method name.
    pub name: String,
    /// Declared arity.
    pub arity: Arity,
    /// File containing the declaration.
    pub file_id: FileId,
    /// Span of the method name token (the rename edit target).
    pub name_span: Span,
    /// Span of the full definition.
    pub decl_span: Span,
}

/// A method invocation expression.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallSite {
    /// Call site ID (stable within the snapshot).
    pub call_id: CallSiteId,
    /// Receiver of the call.
    pub receiver: Receiver,
    /// Invoked method name.
    pub method: String,
    /// Argument count at the call.
    pub argc: u32,
    /// File containing the call.
    pub file_id: FileId,
    /// Span of the method name token (the rename edit target).
    pub name_span: Span,
}

// ============================================================================
// Errors
// ============================================================================

/// Errors that can occur while building the symbol graph.
#[derive(Debug, Error)]
pub enum GraphError {
    /// A referenced container ID is not in the graph.
    #[error("unknown container: {id}")]
    UnknownContainer { id: ContainerId },

    /// A referenced file ID is not in the graph.
    #[error("unknown file: {id}")]
    UnknownFile { id: FileId },

    /// An include edge targets a class.
    #[error("cannot include '{container}': not a module")]
    NotAModule { container: String },

    /// A superclass edge targets a module.
    #[error("cannot inherit from '{container}': not a class")]
    NotAClass { container: String },

    /// Including `module` into `host` would create an inclusion cycle.
    #[error("including '{module}' into '{host}' would create a cycle")]
    IncludeCycle { host: String, module: String },

    /// A container already declares a method with this name.
    #[error("duplicate declaration of '{method}' in '{container}'")]
    DuplicateDeclaration { container: String, method: String },
}

/// Result type for graph operations.
pub type GraphResult<T> = Result<T, GraphError>;

// ============================================================================
// Symbol Graph
// ============================================================================

/// Immutable snapshot of a program's containers, declarations, and calls.
///
/// Built once per invocation from the external symbol table; all resolution
/// and planning reads it without mutation, so independent rename requests
/// may share it across threads.
#[derive(Debug, Clone)]
pub struct SymbolGraph {
    files: Vec<SourceFile>,
    containers: Vec<Container>,
    declarations: Vec<Declaration>,
    call_sites: Vec<CallSite>,
    /// Precomputed linearization per container, indexed by `ContainerId`.
    mros: Vec<Vec<MroEntry>>,
    decls_by_owner: HashMap<ContainerId, Vec<DeclId>>,
    decls_by_name: HashMap<String, Vec<DeclId>>,
}

impl SymbolGraph {
    /// Look up a file by ID.
    pub fn file(&self, id: FileId) -> Option<&SourceFile> {
        self.files.get(id.0 as usize)
    }

    /// Look up a file by workspace-relative path.
    pub fn file_by_path(&self, path: &str) -> Option<&SourceFile> {
        self.files.iter().find(|f| f.path == path)
    }

    /// Look up a container by ID.
    pub fn container(&self, id: ContainerId) -> Option<&Container> {
        self.containers.get(id.0 as usize)
    }

    /// Look up a declaration by ID.
    pub fn declaration(&self, id: DeclId) -> Option<&Declaration> {
        self.declarations.get(id.0 as usize)
    }

    /// Look up a call site by ID.
    pub fn call_site(&self, id: CallSiteId) -> Option<&CallSite> {
        self.call_sites.get(id.0 as usize)
    }

    /// Iterate over all containers in ID order.
    pub fn containers(&self) -> impl Iterator<Item = &Container> {
        self.containers.iter()
    }

    /// Iterate over all declarations in ID order.
    pub fn declarations(&self) -> impl Iterator<Item = &Declaration> {
        self.declarations.iter()
    }

    /// Iterate over all call sites in ID order.
    pub fn call_sites(&self) -> impl Iterator<Item = &CallSite> {
        self.call_sites.iter()
    }

    /// Declarations owned by a container, in declaration order.
    pub fn decls_of(&self, owner: ContainerId) -> &[DeclId] {
        self.decls_by_owner
            .get(&owner)
            .map(|v| v.as_slice())
            .unwrap_or(&[])
    }

    /// Declarations with the given name, across all containers, in ID order.
    pub fn decls_named(&self, name: &str) -> &[DeclId] {
        self.decls_by_name
            .get(name)
            .map(|v| v.as_slice())
            .unwrap_or(&[])
    }

    /// The memoized method resolution order for a container.
    ///
    /// Computed once at build time; subsequent queries are array lookups.
    pub fn mro(&self, id: ContainerId) -> &[MroEntry] {
        self.mros.get(id.0 as usize).map(|v| v.as_slice()).unwrap_or(&[])
    }

    /// Whether `target` appears in `from`'s method resolution order.
    pub fn reaches(&self, from: ContainerId, target: ContainerId) -> bool {
        self.mro(from).iter().any(|e| e.container == target)
    }

    /// Whether two containers are related through either one's MRO.
    ///
    /// Related containers have declared precedence between them (override or
    /// shadow); unrelated containers can only tie.
    pub fn related(&self, a: ContainerId, b: ContainerId) -> bool {
        self.reaches(a, b) || self.reaches(b, a)
    }

    /// Render a declaration as `Container#method` for diagnostics.
    pub fn qualified_name(&self, id: DeclId) -> String {
        match self.declaration(id) {
            Some(decl) => {
                let owner = self
                    .container(decl.owner)
                    .map(|c| c.name.as_str())
                    .unwrap_or("?");
                format!("{}#{}", owner, decl.name)
            }
            None => format!("{}", id),
        }
    }
}

// ============================================================================
// Graph Builder
// ============================================================================

/// Mutable accumulator for symbol graph facts.
///
/// The external parser feeds final program state through the `add_*`
/// methods; [`GraphBuilder::build`] freezes the snapshot and precomputes
/// linearizations.
#[derive(Debug, Default)]
pub struct GraphBuilder {
    files: Vec<SourceFile>,
    containers: Vec<Container>,
    declarations: Vec<Declaration>,
    call_sites: Vec<CallSite>,
}

impl GraphBuilder {
    /// Create an empty builder.
    pub fn new() -> Self {
        GraphBuilder::default()
    }

    /// Register a source file.
    pub fn add_file(&mut self, path: impl Into<String>) -> FileId {
        let file_id = FileId::new(self.files.len() as u32);
        self.files.push(SourceFile {
            file_id,
            path: path.into(),
        });
        file_id
    }

    /// Add a module container.
    pub fn add_module(&mut self, name: impl Into<String>) -> ContainerId {
        self.push_container(name.into(), ContainerKind::Module, None)
    }

    /// Add a class container with an optional superclass.
    ///
    /// The superclass must already exist and be a class, so superclass
    /// chains are acyclic by construction.
    pub fn add_class(
        &mut self,
        name: impl Into<String>,
        superclass: Option<ContainerId>,
    ) -> GraphResult<ContainerId> {
        if let Some(sup) = superclass {
            let parent = self.container_ref(sup)?;
            if parent.kind != ContainerKind::Class {
                return Err(GraphError::NotAClass {
                    container: parent.name.clone(),
                });
            }
        }
        Ok(self.push_container(name.into(), ContainerKind::Class, superclass))
    }

    /// Include `module` into `host`'s lookup chain.
    ///
    /// Idempotent: re-including an already-included module is a no-op and
    /// keeps the module's original (closest) position. Rejects inclusion
    /// edges that would create a cycle.
    pub fn include(&mut self, host: ContainerId, module: ContainerId) -> GraphResult<()> {
        let module_ref = self.container_ref(module)?;
        if module_ref.kind != ContainerKind::Module {
            return Err(GraphError::NotAModule {
                container: module_ref.name.clone(),
            });
        }
        let host_ref = self.container_ref(host)?;

        if host_ref.includes.contains(&module) {
            return Ok(());
        }
        if host == module || self.includes_transitively(module, host) {
            return Err(GraphError::IncludeCycle {
                host: self.containers[host.0 as usize].name.clone(),
                module: self.containers[module.0 as usize].name.clone(),
            });
        }

        self.containers[host.0 as usize].includes.push(module);
        Ok(())
    }

    /// Add a method declaration.
    pub fn add_method(
        &mut self,
        owner: ContainerId,
        name: impl Into<String>,
        arity: Arity,
        file: FileId,
        name_span: Span,
        decl_span: Span,
    ) -> GraphResult<DeclId> {
        let name = name.into();
        self.container_ref(owner)?;
        self.file_ref(file)?;
        let duplicate = self
            .declarations
            .iter()
            .any(|d| d.owner == owner && d.name == name);
        if duplicate {
            return Err(GraphError::DuplicateDeclaration {
                container: self.containers[owner.0 as usize].name.clone(),
                method: name,
            });
        }

        let decl_id = DeclId::new(self.declarations.len() as u32);
        self.declarations.push(Declaration {
            decl_id,
            owner,
            name,
            arity,
            file_id: file,
            name_span,
            decl_span,
        });
        Ok(decl_id)
    }

    /// Add a call site.
    pub fn add_call(
        &mut self,
        file: FileId,
        receiver: Receiver,
        method: impl Into<String>,
        argc: u32,
        name_span: Span,
    ) -> GraphResult<CallSiteId> {
        self.file_ref(file)?;
        if let Receiver::Instance(c) = receiver {
            self.container_ref(c)?;
        }

        let call_id = CallSiteId::new(self.call_sites.len() as u32);
        self.call_sites.push(CallSite {
            call_id,
            receiver,
            method: method.into(),
            argc,
            file_id: file,
            name_span,
        });
        Ok(call_id)
    }

    /// Freeze the accumulated facts into an immutable snapshot.
    ///
    /// Computes every container's linearization and the name/owner indexes.
    pub fn build(self) -> SymbolGraph {
        let mros: Vec<Vec<MroEntry>> = self
            .containers
            .iter()
            .map(|c| linearize(&self.containers, c.container_id))
            .collect();

        let mut decls_by_owner: HashMap<ContainerId, Vec<DeclId>> = HashMap::new();
        let mut decls_by_name: HashMap<String, Vec<DeclId>> = HashMap::new();
        for decl in &self.declarations {
            decls_by_owner.entry(decl.owner).or_default().push(decl.decl_id);
            decls_by_name
                .entry(decl.name.clone())
                .or_default()
                .push(decl.decl_id);
        }

        debug!(
            files = self.files.len(),
            containers = self.containers.len(),
            declarations = self.declarations.len(),
            call_sites = self.call_sites.len(),
            "built symbol graph"
        );

        SymbolGraph {
            files: self.files,
            containers: self.containers,
            declarations: self.declarations,
            call_sites: self.call_sites,
            mros,
            decls_by_owner,
            decls_by_name,
        }
    }

    fn push_container(
        &mut self,
        name: String,
        kind: ContainerKind,
        superclass: Option<ContainerId>,
    ) -> ContainerId {
        let container_id = ContainerId::new(self.containers.len() as u32);
        self.containers.push(Container {
            container_id,
            name,
            kind,
            superclass,
            includes: Vec::new(),
        });
        container_id
    }

    fn container_ref(&self, id: ContainerId) -> GraphResult<&Container> {
        self.containers
            .get(id.0 as usize)
            .ok_or(GraphError::UnknownContainer { id })
    }

    fn file_ref(&self, id: FileId) -> GraphResult<&SourceFile> {
        self.files
            .get(id.0 as usize)
            .ok_or(GraphError::UnknownFile { id })
    }

    /// Whether `from` reaches `target` through include edges.
    fn includes_transitively(&self, from: ContainerId, target: ContainerId) -> bool {
        let mut stack = vec![from];
        let mut seen = vec![false; self.containers.len()];
        while let Some(id) = stack.pop() {
            if id == target {
                return true;
            }
            let idx = id.0 as usize;
            if seen[idx] {
                continue;
            }
            seen[idx] = true;
            stack.extend(self.containers[idx].includes.iter().copied());
        }
        false
    }
}

// ============================================================================
// Tests
// ============================================================================
