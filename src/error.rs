/*!

Errors reported while building routers and while computing routes.

Errors are built through the `error!` macro, which records the source location of the call:

```ignore
return Err(error!(missing_parameter,"id").with_message("a router requires a node id".to_string()));
```

Violations of the flow-control and arbitration invariants are not errors but bugs, and they panic.

*/

use std::fmt::{self,Display,Formatter};

use crate::config::ConfigurationValue;

///The place in the source where an error has been generated.
#[derive(Debug,Clone,PartialEq,Eq)]
pub struct SourceLocation
{
	pub file: &'static str,
	pub line: u32,
	pub column: u32,
}

impl Display for SourceLocation
{
	fn fmt(&self, formatter:&mut Formatter) -> fmt::Result
	{
		write!(formatter,"{}:{}:{}",self.file,self.line,self.column)
	}
}

///Build the `SourceLocation` of the place where the macro is invoked.
#[macro_export]
macro_rules! source_location{
	() => {
		$crate::error::SourceLocation{
			file: file!(),
			line: line!(),
			column: column!(),
		}
	};
}

///Build an `Error` by calling the constructor `Error::$kind` with the current source location and the remaining arguments.
#[macro_export]
macro_rules! error{
	($kind:ident) => {{
		$crate::error::Error::$kind( $crate::source_location!() )
	}};
	($kind:ident, $($args:expr),* ) => {{
		$crate::error::Error::$kind( $crate::source_location!(), $($args),* )
	}};
}

#[derive(Debug,Clone,PartialEq)]
pub enum ErrorKind
{
	///A configuration value that cannot be understood in its context.
	IllFormedConfiguration{
		value: ConfigurationValue,
	},
	///A parameter without default value has not been given.
	MissingParameter{
		name: String,
	},
	///Some argument with invalid value.
	BadArgument,
	///The routing algorithm cannot produce a route for the destination.
	RoutingFailure{
		current_node: usize,
		destination: usize,
	},
	///Anything else.
	Undetermined,
}

#[derive(Debug,Clone,PartialEq)]
pub struct Error
{
	pub source_location: SourceLocation,
	pub kind: ErrorKind,
	pub message: Option<String>,
}

impl Error
{
	pub fn new(source_location:SourceLocation, kind:ErrorKind) -> Error
	{
		Error{
			source_location,
			kind,
			message: None,
		}
	}
	///Attach a human readable message.
	pub fn with_message(mut self, message:String) -> Error
	{
		self.message = Some(message);
		self
	}
	pub fn ill_formed_configuration(source_location:SourceLocation, value:ConfigurationValue) -> Error
	{
		Error::new(source_location,ErrorKind::IllFormedConfiguration{value})
	}
	pub fn missing_parameter(source_location:SourceLocation, name:&str) -> Error
	{
		Error::new(source_location,ErrorKind::MissingParameter{name:name.to_string()})
	}
	pub fn bad_argument(source_location:SourceLocation) -> Error
	{
		Error::new(source_location,ErrorKind::BadArgument)
	}
	pub fn routing_failure(source_location:SourceLocation, current_node:usize, destination:usize) -> Error
	{
		Error::new(source_location,ErrorKind::RoutingFailure{current_node,destination})
	}
	pub fn undetermined(source_location:SourceLocation) -> Error
	{
		Error::new(source_location,ErrorKind::Undetermined)
	}
}

impl Display for ErrorKind
{
	fn fmt(&self, formatter:&mut Formatter) -> fmt::Result
	{
		match self
		{
			ErrorKind::IllFormedConfiguration{value} => write!(formatter,"ill formed configuration: {:?}",value),
			ErrorKind::MissingParameter{name} => write!(formatter,"missing parameter `{}`",name),
			ErrorKind::BadArgument => write!(formatter,"bad argument"),
			ErrorKind::RoutingFailure{current_node,destination} => write!(formatter,"no route from node {} towards node {}",current_node,destination),
			ErrorKind::Undetermined => write!(formatter,"undetermined error"),
		}
	}
}

impl Display for Error
{
	fn fmt(&self, formatter:&mut Formatter) -> fmt::Result
	{
		write!(formatter,"{} at {}",self.kind,self.source_location)?;
		if let Some(ref message) = self.message
		{
			write!(formatter,": {}",message)?;
		}
		Ok(())
	}
}

impl std::error::Error for Error {}
