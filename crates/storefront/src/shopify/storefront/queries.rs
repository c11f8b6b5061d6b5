//! GraphQL documents for the Storefront customer operations.
//!
//! Tokens and emails always travel as variables, never interpolated into the
//! document text.

/// Fields selected whenever a customer is returned.
macro_rules! customer_fields {
    () => {
        "displayName email firstName lastName acceptsMarketing"
    };
}

/// Fields selected for `CustomerUserError` lists.
macro_rules! customer_user_error_fields {
    () => {
        "customerUserErrors { code field message }"
    };
}

pub const CUSTOMER_ACCESS_TOKEN_CREATE: &str = concat!(
    "mutation customerAccessTokenCreate($input: CustomerAccessTokenCreateInput!) {\n",
    "  customerAccessTokenCreate(input: $input) {\n",
    "    customerAccessToken { accessToken expiresAt }\n",
    "    ",
    customer_user_error_fields!(),
    "\n  }\n}\n"
);

pub const CUSTOMER_BY_TOKEN: &str = concat!(
    "query customer($customerAccessToken: String!) {\n",
    "  customer(customerAccessToken: $customerAccessToken) { ",
    customer_fields!(),
    " }\n}\n"
);

pub const CUSTOMER_ACCESS_TOKEN_DELETE: &str = "\
mutation customerAccessTokenDelete($customerAccessToken: String!) {
  customerAccessTokenDelete(customerAccessToken: $customerAccessToken) {
    deletedAccessToken
    userErrors { field message }
  }
}
";

pub const CUSTOMER_CREATE: &str = concat!(
    "mutation customerCreate($input: CustomerCreateInput!) {\n",
    "  customerCreate(input: $input) {\n",
    "    customer { ",
    customer_fields!(),
    " }\n    ",
    customer_user_error_fields!(),
    "\n  }\n}\n"
);

pub const CUSTOMER_RECOVER: &str = concat!(
    "mutation customerRecover($email: String!) {\n",
    "  customerRecover(email: $email) {\n    ",
    customer_user_error_fields!(),
    "\n  }\n}\n"
);
