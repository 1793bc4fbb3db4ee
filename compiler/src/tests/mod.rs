#[cfg(test)]
mod corpus;
