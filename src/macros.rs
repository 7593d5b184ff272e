//! Public macros: option builders and the typed class declaration macro.
//!
//! The option macros keep call sites working when option structs gain fields.

/// Construct [`crate::ParseOptions`] from `Default` and a list of field assignments.
///
/// ```rust
/// use saphyr_meta::DuplicateKeyPolicy;
///
/// let options = saphyr_meta::parse_options! {
///     duplicate_keys: DuplicateKeyPolicy::FirstWins,
///     yaml11_booleans: true,
/// };
/// assert!(options.yaml11_booleans);
/// ```
#[macro_export]
macro_rules! parse_options {
    ( $( $field:ident : $value:expr ),* $(,)? ) => {{
        let mut opt = $crate::ParseOptions::default();
        $(
            opt.$field = $value;
        )*
        opt
    }};
}

/// Construct [`crate::EmitOptions`] from `Default` and a list of field assignments.
///
/// ```rust
/// let options = saphyr_meta::emit_options! {
///     omit_null: true,
///     max_depth: 8,
/// };
/// assert_eq!(options.max_depth, 8);
/// ```
#[macro_export]
macro_rules! emit_options {
    ( $( $field:ident : $value:expr ),* $(,)? ) => {{
        let mut opt = $crate::EmitOptions::default();
        $(
            opt.$field = $value;
        )*
        opt
    }};
}

/// Construct [`crate::RenderOptions`] from `Default` and a list of field assignments.
///
/// ```rust
/// let options = saphyr_meta::render_options! {
///     indent_step: 4,
/// };
/// assert_eq!(options.folded_wrap_chars, 80);
/// ```
#[macro_export]
macro_rules! render_options {
    ( $( $field:ident : $value:expr ),* $(,)? ) => {{
        let mut opt = $crate::RenderOptions::default();
        $(
            opt.$field = $value;
        )*
        opt
    }};
}

/// Declare a typed class.
///
/// Expands to the struct itself plus a `pub metadata: MetadataStore` field, and implements
/// [`TypedClass`](crate::TypedClass), [`YamlObject`](crate::YamlObject) and
/// [`Property`](crate::Property) for it. The struct must derive `Clone`, `Debug`, `Default`
/// and `PartialEq`.
///
/// Fields take an optional `#[yaml(...)]` attribute after their doc comments:
///
/// - `key = "..."` binds the field to that exact document key instead of the derived one,
/// - `converter = "..."` routes the field through a converter registered on the
///   [`Mapper`](crate::Mapper).
///
/// Classes are registered by struct name, so two classes sharing a name cannot be mapped by
/// the same mapper.
///
/// ```rust
/// saphyr_meta::yaml_object! {
///     #[derive(Clone, Debug, Default, PartialEq)]
///     pub struct Endpoint {
///         /// Served under `HTTP`, not the derived `h-t-t-p-url`.
///         #[yaml(key = "HTTP")]
///         pub http_url: String,
///         pub max_connections: Option<i64>,
///     }
/// }
///
/// use saphyr_meta::TypedClass;
/// let keys: Vec<String> = Endpoint::descriptors().iter().map(|d| d.yaml_key()).collect();
/// assert_eq!(keys, ["HTTP", "max-connections"]);
/// ```
#[macro_export]
macro_rules! yaml_object {
    (
        $(#[$meta:meta])*
        $vis:vis struct $name:ident {
            $(
                $(#[doc = $doc:literal])*
                $(#[yaml( $( $opt:ident = $opt_value:literal ),* $(,)? )])?
                $field_vis:vis $field:ident : $field_ty:ty
            ),* $(,)?
        }
    ) => {
        $(#[$meta])*
        $vis struct $name {
            $(
                $(#[doc = $doc])*
                $field_vis $field: $field_ty,
            )*
            /// Comments, tags and styles of this instance's properties.
            pub metadata: $crate::MetadataStore,
        }

        impl $crate::TypedClass for $name {
            const TYPE_NAME: &'static str = stringify!($name);

            fn descriptors() -> &'static [$crate::PropertyDescriptor] {
                static DESCRIPTORS: ::std::sync::OnceLock<::std::vec::Vec<$crate::PropertyDescriptor>> =
                    ::std::sync::OnceLock::new();
                DESCRIPTORS.get_or_init(|| {
                    ::std::vec![
                        $(
                            $crate::PropertyDescriptor {
                                host_name: stringify!($field),
                                key: $crate::__yaml_opt!(key $( $( $opt = $opt_value ),* )?),
                                property_type: <$field_ty as $crate::Property>::property_type(),
                                converter: $crate::__yaml_opt!(converter $( $( $opt = $opt_value ),* )?),
                            },
                        )*
                    ]
                })
            }
        }

        impl $crate::YamlObject for $name {
            fn type_name(&self) -> &'static str {
                <Self as $crate::TypedClass>::TYPE_NAME
            }

            fn properties(&self) -> &'static [$crate::PropertyDescriptor] {
                <Self as $crate::TypedClass>::descriptors()
            }

            fn get(&self, property: &str) -> ::std::option::Option<$crate::Data> {
                match property {
                    $(
                        stringify!($field) => ::std::option::Option::Some(
                            <$field_ty as $crate::Property>::to_data(&self.$field),
                        ),
                    )*
                    _ => ::std::option::Option::None,
                }
            }

            fn set(
                &mut self,
                property: &str,
                value: $crate::Data,
            ) -> ::std::result::Result<(), $crate::Data> {
                match property {
                    $(
                        stringify!($field) => {
                            self.$field = <$field_ty as $crate::Property>::from_data(value)?;
                            ::std::result::Result::Ok(())
                        }
                    )*
                    _ => ::std::result::Result::Err(value),
                }
            }

            fn metadata(&self) -> &$crate::MetadataStore {
                &self.metadata
            }

            fn metadata_mut(&mut self) -> &mut $crate::MetadataStore {
                &mut self.metadata
            }

            fn clone_object(&self) -> ::std::boxed::Box<dyn $crate::YamlObject> {
                ::std::boxed::Box::new(::std::clone::Clone::clone(self))
            }

            fn eq_object(&self, other: &dyn $crate::YamlObject) -> bool {
                other
                    .as_any()
                    .downcast_ref::<Self>()
                    .is_some_and(|other| other == self)
            }

            fn as_any(&self) -> &dyn ::std::any::Any {
                self
            }

            fn into_any(self: ::std::boxed::Box<Self>) -> ::std::boxed::Box<dyn ::std::any::Any> {
                self
            }
        }

        impl $crate::Property for $name {
            fn property_type() -> $crate::PropertyType {
                $crate::PropertyType::Object(stringify!($name))
            }

            fn to_data(&self) -> $crate::Data {
                $crate::Data::Object(::std::boxed::Box::new(::std::clone::Clone::clone(self)))
            }

            fn from_data(data: $crate::Data) -> ::std::result::Result<Self, $crate::Data> {
                $crate::downcast_data::<Self>(data)
            }

            fn register_types(registry: &mut $crate::TypeRegistry) {
                if registry.register::<Self>() {
                    $( <$field_ty as $crate::Property>::register_types(registry); )*
                }
            }
        }
    };
}

/// Pick one `#[yaml(...)]` option out of a field's option list.
#[doc(hidden)]
#[macro_export]
macro_rules! __yaml_opt {
    ($want:ident) => {
        ::std::option::Option::None
    };
    (key key = $value:literal $(, $($rest:tt)*)?) => {
        ::std::option::Option::Some($value)
    };
    (converter converter = $value:literal $(, $($rest:tt)*)?) => {
        ::std::option::Option::Some($value)
    };
    ($want:ident key = $value:literal $(, $($rest:tt)*)?) => {
        $crate::__yaml_opt!($want $($($rest)*)?)
    };
    ($want:ident converter = $value:literal $(, $($rest:tt)*)?) => {
        $crate::__yaml_opt!($want $($($rest)*)?)
    };
}
