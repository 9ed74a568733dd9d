use crate::Expr;
use rustc_hash::FxHashMap;
use std::ops::RangeInclusive;
use std::sync::OnceLock;

/// Definition of a mathematical function including its evaluation and differentiation logic
#[derive(Debug, Clone)]
pub(crate) struct FunctionDefinition {
    /// Canonical name of the function (e.g., "sin", "log")
    pub name: &'static str,

    /// Alternative spellings accepted by the parser (e.g., "Sin", "ArcSin")
    pub aliases: &'static [&'static str],

    /// Acceptable argument count (arity)
    pub arity: RangeInclusive<usize>,

    /// Numerical evaluation function; may return NaN or an infinity outside its domain
    pub eval: fn(&[f64]) -> f64,

    /// Symbolic differentiation function
    /// Arguments: (args of the function call, derivatives of the arguments)
    /// Returns the total derivative dA/dx = sum( (dA/d_arg_i) * (d_arg_i/dx) )
    pub derivative: fn(&[Expr], &[Expr]) -> Expr,
}

impl FunctionDefinition {
    /// Helper to check if argument count is valid
    pub(crate) fn validate_arity(&self, args: usize) -> bool {
        self.arity.contains(&args)
    }
}

struct RegistryTables {
    definitions: FxHashMap<&'static str, FunctionDefinition>,
    aliases: FxHashMap<&'static str, &'static str>,
}

/// Static registry storing all function definitions
static REGISTRY: OnceLock<RegistryTables> = OnceLock::new();

/// Initialize the registry with all function definitions
fn init_registry() -> RegistryTables {
    let defs = crate::functions::definitions::all_definitions();
    let mut definitions = FxHashMap::default();
    let mut aliases = FxHashMap::default();

    for def in defs {
        for alias in def.aliases {
            aliases.insert(*alias, def.name);
        }
        definitions.insert(def.name, def);
    }

    RegistryTables {
        definitions,
        aliases,
    }
}

/// Central registry for getting function definitions
pub(crate) struct Registry;

impl Registry {
    /// Get a function definition by canonical name
    pub(crate) fn get(name: &str) -> Option<&'static FunctionDefinition> {
        REGISTRY.get_or_init(init_registry).definitions.get(name)
    }

    /// Get a function definition by canonical name or any accepted alias
    pub(crate) fn resolve(name: &str) -> Option<&'static FunctionDefinition> {
        let tables = REGISTRY.get_or_init(init_registry);
        let canonical = tables.aliases.get(name).copied().unwrap_or(name);
        tables.definitions.get(canonical)
    }
}
