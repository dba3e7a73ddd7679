use proc_macro::TokenStream;
use proc_macro2::TokenStream as TokenStream2;
use quote::{format_ident, quote};
use syn::{parse_macro_input, spanned::Spanned, FnArg, Ident, ItemFn, Pat, Signature, Type};

/// Transform an asynchronous test into a Rocket async test over a fresh
/// in-memory store, and inject dependencies.
///
/// Injectable dependencies are [`rocket::local::asynchronous::Client`],
/// `crate::model::store::Store`, and, when the attribute is given `staff` or
/// `user`, a [`rocket::http::Header`] authorizing a logged-in account of
/// that kind.
#[proc_macro_attribute]
pub fn backend_test(args: TokenStream, input: TokenStream) -> TokenStream {
    let mut item_fn = parse_macro_input!(input as ItemFn);

    // Work out which account to log in, if any.
    let login = match parse_macro_input!(args as Option<Ident>) {
        None => None,
        Some(arg) if arg == "staff" => Some(quote! { true }),
        Some(arg) if arg == "user" => Some(quote! { false }),
        Some(arg) => {
            return syn::Error::new(arg.span(), "Expected `staff` or `user`")
                .into_compile_error()
                .into();
        }
    };

    // Extract type information and reject invalid function signatures.
    let test_args = match check_sig(item_fn.sig.clone(), login.is_some()) {
        Ok(args) => args,
        Err(err) => {
            return err.into_compile_error().into();
        }
    };

    // Rename the future so the test can have its original name.
    let name = item_fn.sig.ident.clone();
    let new_name = format_ident!("{}_fut", name);
    item_fn.sig.ident = new_name.clone();

    let maybe_login = login
        .map(|staff| {
            quote! {
                let auth_header =
                    crate::api::auth::login_header(&rocket_client, &store, #staff).await;
            }
        })
        .unwrap_or_default();

    // Rewrite the test function.
    quote! {
        #[rocket::async_test]
        async fn #name() {
            /// The test itself.
            #item_fn

            // Test setup.
            let store = crate::model::store::Store::memory();
            let config = crate::Config::example();
            crate::model::db::user::ensure_staff_exists(&store, &config)
                .await
                .unwrap();
            let rocket_client = rocket::local::asynchronous::Client::tracked(
                crate::rocket_for_store(store.clone(), config),
            )
            .await
            .unwrap();

            #maybe_login

            #new_name(#(#test_args),*).await;
        }
    }
    .into()
}

/// Ensure the wrapped test is async, map its parameters to injected values,
/// and reject unknown parameters.
fn check_sig(sig: Signature, logged_in: bool) -> Result<Vec<TokenStream2>, syn::Error> {
    if sig.asyncness.is_none() {
        return Err(syn::Error::new(sig.span(), "Test must be marked `async`"));
    }

    let mut has_client = false;
    let mut has_store = false;
    let mut has_header = false;
    let mut args = vec![];

    for input in &sig.inputs {
        if let FnArg::Typed(pat_type) = input {
            if let (Pat::Ident(_), Type::Path(type_path)) = (&*pat_type.pat, &*pat_type.ty) {
                // Valid as the last path segment for any type is itself
                let type_ident = &type_path.path.segments.last().unwrap().ident;
                if type_ident == "Client" {
                    if has_client {
                        return Err(syn::Error::new(
                            input.span(),
                            "Test cannot accept more than one `rocket::local::asynchronous::Client`",
                        ));
                    }
                    has_client = true;
                    args.push(quote! { rocket_client });
                    continue;
                } else if type_ident == "Store" {
                    if has_store {
                        return Err(syn::Error::new(
                            input.span(),
                            "Test cannot accept more than one `Store`",
                        ));
                    }
                    has_store = true;
                    args.push(quote! { store.clone() });
                    continue;
                } else if type_ident == "Header" {
                    if !logged_in {
                        return Err(syn::Error::new(
                            input.span(),
                            "An authorization `Header` needs `#[backend_test(staff)]` or `#[backend_test(user)]`",
                        ));
                    }
                    if has_header {
                        return Err(syn::Error::new(
                            input.span(),
                            "Test cannot accept more than one `Header`",
                        ));
                    }
                    has_header = true;
                    args.push(quote! { auth_header.clone() });
                    continue;
                }
            }
        }

        return Err(syn::Error::new(
            input.span(),
            "Expected one of `client_ident: Client`, `store_ident: Store` or `auth_ident: Header<'static>`",
        ));
    }

    Ok(args)
}
