//! Span-carrying Java syntax tree produced by [`crate::java::parse`].
//!
//! Every node records the byte range it was parsed from so callers can rewrite
//! the original text with [`crate::edit`] instead of pretty-printing the tree.

use std::fmt;

use crate::Span;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompilationUnit {
    pub package: Option<PackageDecl>,
    pub imports: Vec<ImportDecl>,
    pub types: Vec<TypeDecl>,
    pub range: Span,
}

impl CompilationUnit {
    pub fn package_name(&self) -> &str {
        self.package.as_ref().map(|p| p.name.as_str()).unwrap_or("")
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageDecl {
    pub annotations: Vec<Annotation>,
    pub name: String,
    pub range: Span,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportDecl {
    pub is_static: bool,
    pub is_star: bool,
    /// Dotted path without the trailing `.*`.
    pub path: String,
    pub range: Span,
}

impl ImportDecl {
    /// Last segment of the imported path (`List` for `java.util.List`).
    pub fn simple_name(&self) -> &str {
        self.path.rsplit('.').next().unwrap_or(&self.path)
    }

    /// The type an import brings into scope or draws static members from.
    ///
    /// For `import static a.B.m;` this is `a.B`; for on-demand imports it is
    /// the package or type before `.*`.
    pub fn type_path(&self) -> &str {
        if self.is_static && !self.is_star {
            match self.path.rfind('.') {
                Some(idx) => &self.path[..idx],
                None => &self.path,
            }
        } else {
            &self.path
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TypeKind {
    Class,
    Interface,
    Enum,
    Record,
    Annotation,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeDecl {
    pub kind: TypeKind,
    pub modifiers: Modifiers,
    pub name: String,
    pub name_range: Span,
    pub type_params: Vec<TypeParam>,
    pub extends: Vec<TypeRef>,
    pub implements: Vec<TypeRef>,
    pub permits: Vec<TypeRef>,
    pub record_components: Vec<Param>,
    pub enum_constants: Vec<EnumConstant>,
    pub members: Vec<MemberDecl>,
    pub body_range: Span,
    pub range: Span,
}

impl TypeDecl {
    pub fn is_interface(&self) -> bool {
        matches!(self.kind, TypeKind::Interface | TypeKind::Annotation)
    }

    /// Supertypes as written: `extends` first, then `implements`.
    pub fn supertypes(&self) -> impl Iterator<Item = &TypeRef> {
        self.extends.iter().chain(self.implements.iter())
    }

    pub fn member_types(&self) -> impl Iterator<Item = &TypeDecl> {
        self.members.iter().filter_map(|m| match m {
            MemberDecl::Type(decl) => Some(decl),
            _ => None,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeParam {
    pub annotations: Vec<Annotation>,
    pub name: String,
    pub bounds: Vec<TypeRef>,
    pub range: Span,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnumConstant {
    pub annotations: Vec<Annotation>,
    pub name: String,
    pub name_range: Span,
    /// `None` when the constant has no argument list at all.
    pub args: Option<Vec<Expr>>,
    pub body: Option<ClassBody>,
    pub range: Span,
}

/// Body of an anonymous class or enum constant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassBody {
    pub members: Vec<MemberDecl>,
    pub range: Span,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MemberDecl {
    Field(FieldDecl),
    Method(MethodDecl),
    Constructor(ConstructorDecl),
    Initializer(InitializerDecl),
    Type(TypeDecl),
}

impl MemberDecl {
    pub fn range(&self) -> Span {
        match self {
            MemberDecl::Field(decl) => decl.range,
            MemberDecl::Method(decl) => decl.range,
            MemberDecl::Constructor(decl) => decl.range,
            MemberDecl::Initializer(decl) => decl.range,
            MemberDecl::Type(decl) => decl.range,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Modifier {
    Public,
    Protected,
    Private,
    Static,
    Final,
    Abstract,
    Default,
    Synchronized,
    Native,
    Transient,
    Volatile,
    Strictfp,
    Sealed,
    NonSealed,
}

impl Modifier {
    pub fn from_keyword(text: &str) -> Option<Modifier> {
        Some(match text {
            "public" => Modifier::Public,
            "protected" => Modifier::Protected,
            "private" => Modifier::Private,
            "static" => Modifier::Static,
            "final" => Modifier::Final,
            "abstract" => Modifier::Abstract,
            "default" => Modifier::Default,
            "synchronized" => Modifier::Synchronized,
            "native" => Modifier::Native,
            "transient" => Modifier::Transient,
            "volatile" => Modifier::Volatile,
            "strictfp" => Modifier::Strictfp,
            "sealed" => Modifier::Sealed,
            "non-sealed" => Modifier::NonSealed,
            _ => return None,
        })
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Modifiers {
    pub keywords: Vec<Modifier>,
    pub annotations: Vec<Annotation>,
    pub range: Option<Span>,
}

impl Modifiers {
    pub fn contains(&self, modifier: Modifier) -> bool {
        self.keywords.contains(&modifier)
    }

    pub fn is_static(&self) -> bool {
        self.contains(Modifier::Static)
    }

    pub fn is_final(&self) -> bool {
        self.contains(Modifier::Final)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Annotation {
    /// Name as written, possibly qualified.
    pub name: String,
    pub name_range: Span,
    pub args: AnnotationArgs,
    pub range: Span,
}

impl Annotation {
    pub fn simple_name(&self) -> &str {
        self.name.rsplit('.').next().unwrap_or(&self.name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AnnotationArgs {
    /// `@Marker`
    None,
    /// `@Single(value)`
    Single(Box<Expr>),
    /// `@Normal(a = 1, b = 2)` (also `@Normal()`)
    Named(Vec<AnnotationPair>),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnnotationPair {
    pub name: String,
    pub value: Expr,
    pub range: Span,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldDecl {
    pub modifiers: Modifiers,
    pub ty: TypeRef,
    pub declarators: Vec<VarDeclarator>,
    pub range: Span,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VarDeclarator {
    pub name: String,
    pub name_range: Span,
    /// Extra `[]` written after the name (`int a[]`).
    pub dims: usize,
    pub initializer: Option<Expr>,
    pub range: Span,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MethodDecl {
    pub modifiers: Modifiers,
    pub type_params: Vec<TypeParam>,
    pub return_ty: TypeRef,
    pub name: String,
    pub name_range: Span,
    pub params: Vec<Param>,
    pub throws: Vec<TypeRef>,
    /// Annotation element default (`String value() default "";`).
    pub default_value: Option<Expr>,
    pub body: Option<Block>,
    pub range: Span,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConstructorDecl {
    pub modifiers: Modifiers,
    pub type_params: Vec<TypeParam>,
    pub name: String,
    pub name_range: Span,
    pub params: Vec<Param>,
    pub throws: Vec<TypeRef>,
    /// Compact canonical record constructor (`Point { ... }`).
    pub is_compact: bool,
    pub body: Block,
    pub range: Span,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InitializerDecl {
    pub is_static: bool,
    pub body: Block,
    pub range: Span,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Param {
    pub modifiers: Modifiers,
    pub ty: TypeRef,
    pub is_varargs: bool,
    pub name: String,
    pub name_range: Span,
    pub dims: usize,
    pub range: Span,
}

impl Param {
    /// The parameter type including dims written after the name. Varargs are
    /// kept separate (see [`Param::is_varargs`]).
    pub fn full_type(&self) -> TypeRef {
        TypeRef::with_dims(self.ty.clone(), self.dims)
    }

    /// Type as it appears in a signature: `String...` for varargs.
    pub fn written_type(&self) -> String {
        let ty = self.full_type();
        if self.is_varargs {
            format!("{ty}...")
        } else {
            ty.to_string()
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PrimitiveKind {
    Boolean,
    Byte,
    Short,
    Int,
    Long,
    Char,
    Float,
    Double,
}

impl PrimitiveKind {
    pub fn from_keyword(text: &str) -> Option<PrimitiveKind> {
        Some(match text {
            "boolean" => PrimitiveKind::Boolean,
            "byte" => PrimitiveKind::Byte,
            "short" => PrimitiveKind::Short,
            "int" => PrimitiveKind::Int,
            "long" => PrimitiveKind::Long,
            "char" => PrimitiveKind::Char,
            "float" => PrimitiveKind::Float,
            "double" => PrimitiveKind::Double,
            _ => return None,
        })
    }

    pub fn keyword(self) -> &'static str {
        match self {
            PrimitiveKind::Boolean => "boolean",
            PrimitiveKind::Byte => "byte",
            PrimitiveKind::Short => "short",
            PrimitiveKind::Int => "int",
            PrimitiveKind::Long => "long",
            PrimitiveKind::Char => "char",
            PrimitiveKind::Float => "float",
            PrimitiveKind::Double => "double",
        }
    }

    pub fn is_numeric(self) -> bool {
        !matches!(self, PrimitiveKind::Boolean)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeRef {
    pub kind: TypeRefKind,
    pub range: Span,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypeRefKind {
    Primitive(PrimitiveKind),
    Void,
    /// Local variable type inference (`var x = ...`).
    Var,
    Named(Vec<TypeSegment>),
    Array(Box<TypeRef>),
    Wildcard(Option<WildcardBound>),
    /// Multi-catch alternatives (`A | B`).
    Union(Vec<TypeRef>),
    /// Intersection cast target (`A & B`).
    Intersection(Vec<TypeRef>),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WildcardBound {
    Extends(Box<TypeRef>),
    Super(Box<TypeRef>),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeSegment {
    pub name: String,
    /// `None` without brackets; `Some(vec![])` for the diamond `<>`.
    pub args: Option<Vec<TypeRef>>,
    pub range: Span,
}

impl TypeRef {
    pub fn with_dims(ty: TypeRef, dims: usize) -> TypeRef {
        let mut ty = ty;
        for _ in 0..dims {
            let range = ty.range;
            ty = TypeRef {
                kind: TypeRefKind::Array(Box::new(ty)),
                range,
            };
        }
        ty
    }

    pub fn is_primitive(&self) -> bool {
        matches!(self.kind, TypeRefKind::Primitive(_))
    }

    pub fn is_void(&self) -> bool {
        matches!(self.kind, TypeRefKind::Void)
    }

    /// Dotted name of a named type without type arguments.
    pub fn qualified_name(&self) -> Option<String> {
        match &self.kind {
            TypeRefKind::Named(segments) => Some(
                segments
                    .iter()
                    .map(|s| s.name.as_str())
                    .collect::<Vec<_>>()
                    .join("."),
            ),
            _ => None,
        }
    }

    /// Innermost element type of an array type (the type itself otherwise).
    pub fn element_type(&self) -> &TypeRef {
        match &self.kind {
            TypeRefKind::Array(inner) => inner.element_type(),
            _ => self,
        }
    }

    /// Type arguments of every segment, outermost first.
    pub fn type_arguments(&self) -> Vec<&TypeRef> {
        match &self.kind {
            TypeRefKind::Named(segments) => segments
                .iter()
                .filter_map(|s| s.args.as_ref())
                .flatten()
                .collect(),
            TypeRefKind::Array(inner) => inner.type_arguments(),
            _ => Vec::new(),
        }
    }
}

impl fmt::Display for TypeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            TypeRefKind::Primitive(kind) => f.write_str(kind.keyword()),
            TypeRefKind::Void => f.write_str("void"),
            TypeRefKind::Var => f.write_str("var"),
            TypeRefKind::Named(segments) => {
                for (idx, segment) in segments.iter().enumerate() {
                    if idx > 0 {
                        f.write_str(".")?;
                    }
                    f.write_str(&segment.name)?;
                    if let Some(args) = &segment.args {
                        f.write_str("<")?;
                        for (i, arg) in args.iter().enumerate() {
                            if i > 0 {
                                f.write_str(", ")?;
                            }
                            write!(f, "{arg}")?;
                        }
                        f.write_str(">")?;
                    }
                }
                Ok(())
            }
            TypeRefKind::Array(inner) => write!(f, "{inner}[]"),
            TypeRefKind::Wildcard(None) => f.write_str("?"),
            TypeRefKind::Wildcard(Some(WildcardBound::Extends(bound))) => {
                write!(f, "? extends {bound}")
            }
            TypeRefKind::Wildcard(Some(WildcardBound::Super(bound))) => {
                write!(f, "? super {bound}")
            }
            TypeRefKind::Union(alternatives) => write_joined(f, alternatives, " | "),
            TypeRefKind::Intersection(bounds) => write_joined(f, bounds, " & "),
        }
    }
}

fn write_joined(f: &mut fmt::Formatter<'_>, types: &[TypeRef], sep: &str) -> fmt::Result {
    for (idx, ty) in types.iter().enumerate() {
        if idx > 0 {
            f.write_str(sep)?;
        }
        write!(f, "{ty}")?;
    }
    Ok(())
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Block {
    pub statements: Vec<Stmt>,
    pub range: Span,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Stmt {
    Block(Block),
    LocalVar(LocalVarDecl),
    LocalType(Box<TypeDecl>),
    Expr(ExprStmt),
    If(IfStmt),
    While(WhileStmt),
    DoWhile(DoWhileStmt),
    For(ForStmt),
    ForEach(ForEachStmt),
    Return(ReturnStmt),
    Throw(ThrowStmt),
    Break(JumpStmt),
    Continue(JumpStmt),
    Yield(YieldStmt),
    Try(TryStmt),
    Switch(SwitchStmt),
    Synchronized(SynchronizedStmt),
    Labeled(LabeledStmt),
    Assert(AssertStmt),
    ExplicitCtorCall(ExplicitCtorCall),
    Empty(Span),
}

impl Stmt {
    pub fn range(&self) -> Span {
        match self {
            Stmt::Block(block) => block.range,
            Stmt::LocalVar(stmt) => stmt.range,
            Stmt::LocalType(decl) => decl.range,
            Stmt::Expr(stmt) => stmt.range,
            Stmt::If(stmt) => stmt.range,
            Stmt::While(stmt) => stmt.range,
            Stmt::DoWhile(stmt) => stmt.range,
            Stmt::For(stmt) => stmt.range,
            Stmt::ForEach(stmt) => stmt.range,
            Stmt::Return(stmt) => stmt.range,
            Stmt::Throw(stmt) => stmt.range,
            Stmt::Break(stmt) | Stmt::Continue(stmt) => stmt.range,
            Stmt::Yield(stmt) => stmt.range,
            Stmt::Try(stmt) => stmt.range,
            Stmt::Switch(stmt) => stmt.range,
            Stmt::Synchronized(stmt) => stmt.range,
            Stmt::Labeled(stmt) => stmt.range,
            Stmt::Assert(stmt) => stmt.range,
            Stmt::ExplicitCtorCall(stmt) => stmt.range,
            Stmt::Empty(range) => *range,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalVarDecl {
    pub modifiers: Modifiers,
    pub ty: TypeRef,
    pub declarators: Vec<VarDeclarator>,
    pub range: Span,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExprStmt {
    pub expr: Expr,
    pub range: Span,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IfStmt {
    pub cond: Expr,
    pub then_branch: Box<Stmt>,
    pub else_branch: Option<Box<Stmt>>,
    pub range: Span,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WhileStmt {
    pub cond: Expr,
    pub body: Box<Stmt>,
    pub range: Span,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DoWhileStmt {
    pub body: Box<Stmt>,
    pub cond: Expr,
    pub range: Span,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ForStmt {
    /// Local declarations or expression statements.
    pub init: Vec<Stmt>,
    pub cond: Option<Expr>,
    pub update: Vec<Expr>,
    pub body: Box<Stmt>,
    pub range: Span,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ForEachStmt {
    pub modifiers: Modifiers,
    pub ty: TypeRef,
    pub name: String,
    pub name_range: Span,
    pub iterable: Expr,
    pub body: Box<Stmt>,
    pub range: Span,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReturnStmt {
    pub expr: Option<Expr>,
    pub range: Span,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ThrowStmt {
    pub expr: Expr,
    pub range: Span,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JumpStmt {
    pub label: Option<String>,
    pub range: Span,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct YieldStmt {
    pub expr: Expr,
    pub range: Span,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TryStmt {
    pub resources: Vec<Resource>,
    pub body: Block,
    pub catches: Vec<CatchClause>,
    pub finally: Option<Block>,
    pub range: Span,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resource {
    Decl(LocalVarDecl),
    Expr(Expr),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatchClause {
    /// The parameter type is a [`TypeRefKind::Union`] for multi-catch.
    pub param: Param,
    pub body: Block,
    pub range: Span,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SwitchStmt {
    pub selector: Expr,
    pub cases: Vec<SwitchCase>,
    pub range: Span,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SwitchCase {
    pub labels: Vec<CaseLabel>,
    /// `default:` / `default ->` / `case null, default`.
    pub is_default: bool,
    pub guard: Option<Expr>,
    /// Written with `->` rather than `:`.
    pub is_arrow: bool,
    pub body: Vec<Stmt>,
    pub range: Span,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CaseLabel {
    Expr(Expr),
    /// Type pattern (`case String s ->`).
    Pattern {
        ty: TypeRef,
        name: String,
        range: Span,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SynchronizedStmt {
    pub lock: Expr,
    pub body: Block,
    pub range: Span,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LabeledStmt {
    pub label: String,
    pub body: Box<Stmt>,
    pub range: Span,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssertStmt {
    pub cond: Expr,
    pub message: Option<Expr>,
    pub range: Span,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CtorCallKind {
    This,
    Super,
}

/// `this(...)` or `super(...)` as the first statement of a constructor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExplicitCtorCall {
    pub kind: CtorCallKind,
    /// `outer.super(...)`
    pub qualifier: Option<Box<Expr>>,
    pub args: Vec<Expr>,
    pub range: Span,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Expr {
    Name(NameExpr),
    Literal(LiteralExpr),
    This(ThisExpr),
    Super(SuperExpr),
    FieldAccess(FieldAccessExpr),
    MethodCall(MethodCallExpr),
    New(NewExpr),
    NewArray(NewArrayExpr),
    ArrayInit(ArrayInit),
    ArrayAccess(ArrayAccessExpr),
    Unary(UnaryExpr),
    Binary(BinaryExpr),
    Assign(AssignExpr),
    Conditional(ConditionalExpr),
    Cast(CastExpr),
    InstanceOf(InstanceOfExpr),
    Lambda(LambdaExpr),
    MethodRef(MethodRefExpr),
    ClassLit(ClassLitExpr),
    Switch(SwitchExpr),
    Paren(ParenExpr),
    /// Nested annotation used as an annotation element value.
    Annotation(Box<Annotation>),
    /// A type used as a method reference receiver (`int[]::new`).
    Type(TypeRef),
    Missing(Span),
}

impl Expr {
    pub fn range(&self) -> Span {
        match self {
            Expr::Name(expr) => expr.range,
            Expr::Literal(expr) => expr.range,
            Expr::This(expr) => expr.range,
            Expr::Super(expr) => expr.range,
            Expr::FieldAccess(expr) => expr.range,
            Expr::MethodCall(expr) => expr.range,
            Expr::New(expr) => expr.range,
            Expr::NewArray(expr) => expr.range,
            Expr::ArrayInit(expr) => expr.range,
            Expr::ArrayAccess(expr) => expr.range,
            Expr::Unary(expr) => expr.range,
            Expr::Binary(expr) => expr.range,
            Expr::Assign(expr) => expr.range,
            Expr::Conditional(expr) => expr.range,
            Expr::Cast(expr) => expr.range,
            Expr::InstanceOf(expr) => expr.range,
            Expr::Lambda(expr) => expr.range,
            Expr::MethodRef(expr) => expr.range,
            Expr::ClassLit(expr) => expr.range,
            Expr::Switch(expr) => expr.range,
            Expr::Paren(expr) => expr.range,
            Expr::Annotation(ann) => ann.range,
            Expr::Type(ty) => ty.range,
            Expr::Missing(range) => *range,
        }
    }

    /// Dotted text of a `Name`/`FieldAccess` chain (`a.b.C`), if the
    /// expression is one.
    pub fn as_dotted_name(&self) -> Option<String> {
        match self {
            Expr::Name(name) => Some(name.name.clone()),
            Expr::FieldAccess(access) => {
                let mut prefix = access.receiver.as_dotted_name()?;
                prefix.push('.');
                prefix.push_str(&access.name);
                Some(prefix)
            }
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NameExpr {
    pub name: String,
    pub range: Span,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LiteralKind {
    Int,
    Long,
    Float,
    Double,
    Char,
    String,
    TextBlock,
    Bool,
    Null,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LiteralExpr {
    pub kind: LiteralKind,
    pub text: String,
    pub range: Span,
}

/// `this` or `Outer.this`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ThisExpr {
    pub qualifier: Option<String>,
    pub range: Span,
}

/// `super` or `Iface.super`; only valid as a receiver.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SuperExpr {
    pub qualifier: Option<String>,
    pub range: Span,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldAccessExpr {
    pub receiver: Box<Expr>,
    pub name: String,
    pub name_range: Span,
    pub range: Span,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MethodCallExpr {
    pub receiver: Option<Box<Expr>>,
    pub type_args: Vec<TypeRef>,
    pub name: String,
    pub name_range: Span,
    pub args: Vec<Expr>,
    pub range: Span,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewExpr {
    /// Enclosing instance for `outer.new Inner()`.
    pub outer: Option<Box<Expr>>,
    pub ty: TypeRef,
    pub args: Vec<Expr>,
    /// Anonymous class body.
    pub body: Option<ClassBody>,
    pub range: Span,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewArrayExpr {
    pub elem_ty: TypeRef,
    pub dim_exprs: Vec<Expr>,
    /// Total number of dimensions, sized or not.
    pub dims: usize,
    pub init: Option<ArrayInit>,
    pub range: Span,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArrayInit {
    pub elements: Vec<Expr>,
    pub range: Span,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArrayAccessExpr {
    pub array: Box<Expr>,
    pub index: Box<Expr>,
    pub range: Span,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    Plus,
    Minus,
    Not,
    BitNot,
    PreInc,
    PreDec,
    PostInc,
    PostDec,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnaryExpr {
    pub op: UnaryOp,
    pub operand: Box<Expr>,
    pub range: Span,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Mul,
    Div,
    Rem,
    Add,
    Sub,
    Shl,
    Shr,
    UShr,
    Lt,
    Gt,
    Le,
    Ge,
    Eq,
    Ne,
    BitAnd,
    BitXor,
    BitOr,
    And,
    Or,
}

impl BinaryOp {
    pub fn is_comparison(self) -> bool {
        matches!(
            self,
            BinaryOp::Lt
                | BinaryOp::Gt
                | BinaryOp::Le
                | BinaryOp::Ge
                | BinaryOp::Eq
                | BinaryOp::Ne
                | BinaryOp::And
                | BinaryOp::Or
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BinaryExpr {
    pub op: BinaryOp,
    pub lhs: Box<Expr>,
    pub rhs: Box<Expr>,
    pub range: Span,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssignOp {
    Assign,
    Add,
    Sub,
    Mul,
    Div,
    Rem,
    And,
    Or,
    Xor,
    Shl,
    Shr,
    UShr,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssignExpr {
    pub op: AssignOp,
    pub target: Box<Expr>,
    pub value: Box<Expr>,
    pub range: Span,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConditionalExpr {
    pub cond: Box<Expr>,
    pub then_expr: Box<Expr>,
    pub else_expr: Box<Expr>,
    pub range: Span,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CastExpr {
    pub ty: TypeRef,
    pub expr: Box<Expr>,
    pub range: Span,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstanceOfExpr {
    pub expr: Box<Expr>,
    pub ty: TypeRef,
    /// Pattern binding (`x instanceof String s`).
    pub binding: Option<String>,
    pub range: Span,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LambdaExpr {
    pub params: Vec<LambdaParam>,
    pub body: LambdaBody,
    pub range: Span,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LambdaParam {
    pub modifiers: Modifiers,
    /// `None` for implicitly typed parameters.
    pub ty: Option<TypeRef>,
    pub name: String,
    pub name_range: Span,
    pub range: Span,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LambdaBody {
    Expr(Box<Expr>),
    Block(Block),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MethodRefExpr {
    pub receiver: Box<Expr>,
    /// Method name, or `new` for constructor references.
    pub name: String,
    pub range: Span,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassLitExpr {
    pub ty: TypeRef,
    pub range: Span,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SwitchExpr {
    pub selector: Box<Expr>,
    pub cases: Vec<SwitchCase>,
    pub range: Span,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParenExpr {
    pub expr: Box<Expr>,
    pub range: Span,
}
