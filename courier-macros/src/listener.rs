//! `#[listener]`: the metadata scanner for annotated impl blocks.

use proc_macro::TokenStream;
use proc_macro2::TokenStream as TokenStream2;
use quote::quote;
use syn::{
    Attribute, FnArg, GenericArgument, Ident, ImplItem, ImplItemFn, ItemImpl, LitStr, Meta,
    PathArguments, ReturnType, Token, Type,
    parse::{Parse, ParseStream},
    parse_macro_input,
};

/// Delivery lane requested by `#[subscribe(...)]`.
enum ModeArg {
    Immediate,
    Main,
    Background(Option<LitStr>),
}

/// Arguments for `#[subscribe(...)]`.
struct SubscribeArgs {
    mode: ModeArg,
}

impl Parse for SubscribeArgs {
    fn parse(input: ParseStream) -> syn::Result<Self> {
        let mut lane: Option<Ident> = None;
        let mut queue: Option<LitStr> = None;

        while !input.is_empty() {
            let ident: Ident = input.parse()?;

            match ident.to_string().as_str() {
                "immediate" | "main" | "background" => {
                    if lane.is_some() {
                        return Err(syn::Error::new(ident.span(), "mode given twice"));
                    }
                    lane = Some(ident);
                }
                "queue" => {
                    input.parse::<Token![=]>()?;
                    queue = Some(input.parse()?);
                }
                other => {
                    return Err(syn::Error::new(
                        ident.span(),
                        format!("unknown subscribe argument: {}", other),
                    ));
                }
            }

            if input.peek(Token![,]) {
                input.parse::<Token![,]>()?;
            }
        }

        let mode = match (lane, queue) {
            (None, None) => ModeArg::Immediate,
            (None, Some(queue)) => ModeArg::Background(Some(queue)),
            (Some(lane), queue) => match lane.to_string().as_str() {
                "background" => ModeArg::Background(queue),
                _ if queue.is_some() => {
                    return Err(syn::Error::new(
                        lane.span(),
                        "`queue` only applies to background handlers",
                    ));
                }
                "main" => ModeArg::Main,
                _ => ModeArg::Immediate,
            },
        };

        Ok(SubscribeArgs { mode })
    }
}

impl SubscribeArgs {
    fn from_attr(attr: &Attribute) -> syn::Result<Self> {
        match &attr.meta {
            Meta::Path(_) => Ok(SubscribeArgs {
                mode: ModeArg::Immediate,
            }),
            _ => attr.parse_args(),
        }
    }

    fn mode_tokens(&self) -> TokenStream2 {
        match &self.mode {
            ModeArg::Immediate => quote! { ::courier::DispatchMode::Immediate },
            ModeArg::Main => quote! { ::courier::DispatchMode::Main },
            ModeArg::Background(Some(queue)) => {
                quote! { ::courier::DispatchMode::background(#queue) }
            }
            ModeArg::Background(None) => quote! { ::courier::DispatchMode::default_background() },
        }
    }
}

enum Marker {
    Subscribe(SubscribeArgs),
    Produce,
}

fn is_marker(attr: &Attribute) -> bool {
    attr.path().is_ident("subscribe") || attr.path().is_ident("produce")
}

/// Take the `#[subscribe]` / `#[produce]` marker off a method, if any.
fn take_marker(method: &mut ImplItemFn) -> syn::Result<Option<Marker>> {
    let mut marker = None;
    for attr in method.attrs.iter().filter(|attr| is_marker(attr)) {
        if marker.is_some() {
            return Err(syn::Error::new_spanned(
                attr,
                "a method can be either one handler or one producer",
            ));
        }
        marker = Some(if attr.path().is_ident("subscribe") {
            Marker::Subscribe(SubscribeArgs::from_attr(attr)?)
        } else {
            if !matches!(attr.meta, Meta::Path(_)) {
                return Err(syn::Error::new_spanned(attr, "`produce` takes no arguments"));
            }
            Marker::Produce
        });
    }
    method.attrs.retain(|attr| !is_marker(attr));
    Ok(marker)
}

fn require_ref_self(method: &ImplItemFn) -> syn::Result<()> {
    match method.sig.inputs.first() {
        Some(FnArg::Receiver(receiver))
            if receiver.reference.is_some() && receiver.mutability.is_none() =>
        {
            Ok(())
        }
        _ => Err(syn::Error::new_spanned(
            &method.sig,
            "listener methods must take `&self`",
        )),
    }
}

/// `fn on_x(&self, event: &X)` → `X`.
fn handled_type(method: &ImplItemFn) -> syn::Result<Type> {
    require_ref_self(method)?;
    let mut inputs = method.sig.inputs.iter().skip(1);
    match (inputs.next(), inputs.next()) {
        (Some(FnArg::Typed(pat_type)), None) => match &*pat_type.ty {
            Type::Reference(type_ref) if type_ref.mutability.is_none() => {
                Ok((*type_ref.elem).clone())
            }
            other => Err(syn::Error::new_spanned(
                other,
                "handler event argument must be a shared reference (&Event)",
            )),
        },
        _ => Err(syn::Error::new_spanned(
            &method.sig,
            "handler must take exactly one event argument: fn(&self, event: &Event)",
        )),
    }
}

/// `fn x(&self) -> Option<X>` → `X`.
fn produced_type(method: &ImplItemFn) -> syn::Result<Type> {
    require_ref_self(method)?;
    if method.sig.inputs.len() != 1 {
        return Err(syn::Error::new_spanned(
            &method.sig,
            "producer must take only `&self`",
        ));
    }
    let error = || {
        syn::Error::new_spanned(&method.sig.output, "producer must return `Option<Event>`")
    };
    let ReturnType::Type(_, ty) = &method.sig.output else {
        return Err(error());
    };
    let Type::Path(path) = &**ty else {
        return Err(error());
    };
    let Some(segment) = path.path.segments.last() else {
        return Err(error());
    };
    if segment.ident != "Option" {
        return Err(error());
    }
    match &segment.arguments {
        PathArguments::AngleBracketed(args) if args.args.len() == 1 => match args.args.first() {
            Some(GenericArgument::Type(inner)) => Ok(inner.clone()),
            _ => Err(error()),
        },
        _ => Err(error()),
    }
}

/// Implementation of the `#[listener]` attribute macro.
pub fn listener_impl(attr: TokenStream, item: TokenStream) -> TokenStream {
    if !attr.is_empty() {
        return syn::Error::new(
            proc_macro2::Span::call_site(),
            "`#[listener]` takes no arguments",
        )
        .to_compile_error()
        .into();
    }
    let mut input = parse_macro_input!(item as ItemImpl);

    match expand(&mut input) {
        Ok(declare) => {
            let (impl_generics, _, where_clause) = input.generics.split_for_impl();
            let self_ty = &input.self_ty;
            let expanded = quote! {
                #input

                impl #impl_generics ::courier::Listener for #self_ty #where_clause {
                    #[allow(unused_variables)]
                    fn declare(bindings: &mut ::courier::Bindings<Self>) {
                        #(#declare)*
                    }
                }
            };
            TokenStream::from(expanded)
        }
        Err(err) => err.to_compile_error().into(),
    }
}

fn expand(input: &mut ItemImpl) -> syn::Result<Vec<TokenStream2>> {
    if let Some((_, path, _)) = &input.trait_ {
        return Err(syn::Error::new_spanned(
            path,
            "`#[listener]` goes on an inherent impl block",
        ));
    }

    let mut declare = Vec::new();
    for item in &mut input.items {
        let ImplItem::Fn(method) = item else {
            continue;
        };
        let Some(marker) = take_marker(method)? else {
            continue;
        };
        let name = &method.sig.ident;
        match marker {
            Marker::Subscribe(args) => {
                let event_type = handled_type(method)?;
                let mode = args.mode_tokens();
                declare.push(quote! {
                    bindings.subscribe::<#event_type, _, _>(#mode, Self::#name);
                });
            }
            Marker::Produce => {
                let event_type = produced_type(method)?;
                declare.push(quote! {
                    bindings.produce::<#event_type, _>(Self::#name);
                });
            }
        }
    }
    Ok(declare)
}
