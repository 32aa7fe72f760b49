pub mod resolver;
pub mod table;

pub use resolver::RouteResolver;
pub use table::RouteTable;
