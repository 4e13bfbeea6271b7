//! Simple names of the classes and interfaces in `java.lang`.
//!
//! Java code sees every name in this table without an import. Nested types are
//! listed in their source form (`Thread.State`).

const JAVA_LANG_NAMES: &[&str] = &[
    "AbstractMethodError",
    "Appendable",
    "ArithmeticException",
    "ArrayIndexOutOfBoundsException",
    "ArrayStoreException",
    "AssertionError",
    "AutoCloseable",
    "Boolean",
    "BootstrapMethodError",
    "Byte",
    "CharSequence",
    "Character",
    "Character.Subset",
    "Character.UnicodeBlock",
    "Character.UnicodeScript",
    "Class",
    "ClassCastException",
    "ClassCircularityError",
    "ClassFormatError",
    "ClassLoader",
    "ClassNotFoundException",
    "ClassValue",
    "CloneNotSupportedException",
    "Cloneable",
    "Comparable",
    "Deprecated",
    "Double",
    "Enum",
    "Enum.EnumDesc",
    "EnumConstantNotPresentException",
    "Error",
    "Exception",
    "ExceptionInInitializerError",
    "Float",
    "FunctionalInterface",
    "IdentityException",
    "IllegalAccessError",
    "IllegalAccessException",
    "IllegalArgumentException",
    "IllegalCallerException",
    "IllegalMonitorStateException",
    "IllegalStateException",
    "IllegalThreadStateException",
    "IncompatibleClassChangeError",
    "IndexOutOfBoundsException",
    "InheritableThreadLocal",
    "InstantiationError",
    "InstantiationException",
    "Integer",
    "InternalError",
    "InterruptedException",
    "Iterable",
    "LayerInstantiationException",
    "LinkageError",
    "Long",
    "MatchException",
    "Math",
    "Module",
    "ModuleLayer",
    "ModuleLayer.Controller",
    "NegativeArraySizeException",
    "NoClassDefFoundError",
    "NoSuchFieldError",
    "NoSuchFieldException",
    "NoSuchMethodError",
    "NoSuchMethodException",
    "NullPointerException",
    "Number",
    "NumberFormatException",
    "Object",
    "OutOfMemoryError",
    "Override",
    "Package",
    "Process",
    "ProcessBuilder",
    "ProcessBuilder.Redirect",
    "ProcessBuilder.Redirect.Type",
    "ProcessHandle",
    "ProcessHandle.Info",
    "Readable",
    "Record",
    "ReflectiveOperationException",
    "Runnable",
    "Runtime",
    "Runtime.Version",
    "RuntimeException",
    "RuntimePermission",
    "SafeVarargs",
    "SecurityException",
    "SecurityManager",
    "Short",
    "StackOverflowError",
    "StackTraceElement",
    "StackWalker",
    "StackWalker.Option",
    "StackWalker.StackFrame",
    "StrictMath",
    "String",
    "StringBuffer",
    "StringBuilder",
    "StringIndexOutOfBoundsException",
    "SuppressWarnings",
    "System",
    "System.Logger",
    "System.Logger.Level",
    "System.LoggerFinder",
    "Thread",
    "Thread.Builder",
    "Thread.Builder.OfPlatform",
    "Thread.Builder.OfVirtual",
    "Thread.State",
    "Thread.UncaughtExceptionHandler",
    "ThreadDeath",
    "ThreadGroup",
    "ThreadLocal",
    "Throwable",
    "TypeNotPresentException",
    "UnknownError",
    "UnsatisfiedLinkError",
    "UnsupportedClassVersionError",
    "UnsupportedOperationException",
    "VerifyError",
    "VirtualMachineError",
    "Void",
    "WrongThreadException",
];

/// Returns `true` when `simple_name` names a type in `java.lang`.
pub fn is_java_lang_name(simple_name: &str) -> bool {
    JAVA_LANG_NAMES.binary_search(&simple_name).is_ok()
}

/// Fully qualified form of a `java.lang` simple name, if it is one.
pub fn qualify_java_lang(simple_name: &str) -> Option<String> {
    is_java_lang_name(simple_name).then(|| format!("java.lang.{simple_name}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn table_is_sorted_for_binary_search() {
        assert!(JAVA_LANG_NAMES.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn recognizes_builtin_names() {
        assert!(is_java_lang_name("String"));
        assert!(is_java_lang_name("Thread.State"));
        assert!(is_java_lang_name("AutoCloseable"));
        assert!(!is_java_lang_name("List"));
        assert!(!is_java_lang_name("string"));
        assert_eq!(qualify_java_lang("Integer").as_deref(), Some("java.lang.Integer"));
        assert_eq!(qualify_java_lang("Map"), None);
    }
}
