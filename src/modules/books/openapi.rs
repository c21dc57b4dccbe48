//! OpenAPI fragment for the books module. Paths are relative to the module
//! mount point.

use serde_json::{json, Value};

fn envelope_response(description: &str, member: &str, schema: Value) -> Value {
    json!({
        "description": description,
        "content": {
            "application/json": {
                "schema": {
                    "type": "object",
                    "properties": {
                        "success": { "type": "boolean" },
                        "message": { "type": "string" },
                        member: schema
                    },
                    "required": ["success", "message", member]
                }
            }
        }
    })
}

fn failure_response(description: &str) -> Value {
    json!({
        "description": description,
        "content": {
            "application/json": {
                "schema": { "$ref": "#/components/schemas/ErrorResponse" }
            }
        }
    })
}

fn book_ref() -> Value {
    json!({ "$ref": "#/components/schemas/Book" })
}

fn nullable_book() -> Value {
    json!({ "oneOf": [book_ref(), { "type": "null" }] })
}

fn id_parameter() -> Value {
    json!({
        "name": "id",
        "in": "path",
        "required": true,
        "schema": { "type": "string" }
    })
}

fn query_parameter(name: &str, description: &str) -> Value {
    json!({
        "name": name,
        "in": "query",
        "required": false,
        "description": description,
        "schema": { "type": "string" }
    })
}

fn json_body(schema: &str) -> Value {
    json!({
        "required": true,
        "content": {
            "application/json": {
                "schema": { "$ref": format!("#/components/schemas/{schema}") }
            }
        }
    })
}

fn schemas() -> Value {
    let genres = json!(["FICTION", "NON_FICTION", "SCIENCE", "HISTORY", "BIOGRAPHY", "FANTASY"]);

    json!({
        "Book": {
            "type": "object",
            "properties": {
                "id": { "type": "string" },
                "title": { "type": "string" },
                "author": { "type": "string" },
                "genre": { "type": "string", "enum": genres },
                "isbn": { "type": "string", "minLength": 10, "maxLength": 13 },
                "description": { "type": "string" },
                "copies": { "type": "integer", "minimum": 0 },
                "available": { "type": "boolean" },
                "createdAt": { "type": "string", "format": "date-time" },
                "updatedAt": { "type": "string", "format": "date-time" }
            },
            "required": [
                "id", "title", "author", "genre", "isbn", "description",
                "copies", "available", "createdAt", "updatedAt"
            ]
        },
        "CreateBook": {
            "type": "object",
            "properties": {
                "title": { "type": "string" },
                "author": { "type": "string" },
                "genre": { "type": "string", "description": "Case-insensitive genre name" },
                "isbn": { "type": "string", "description": "Exactly 10 or 13 characters" },
                "description": { "type": "string" },
                "copies": { "type": "integer", "minimum": 0 },
                "available": { "type": "boolean", "default": true }
            },
            "required": ["title", "author", "genre", "isbn", "copies"]
        },
        "UpdateBook": {
            "type": "object",
            "description": "Any subset of the CreateBook fields",
            "properties": {
                "title": { "type": "string" },
                "author": { "type": "string" },
                "genre": { "type": "string" },
                "isbn": { "type": "string" },
                "description": { "type": "string" },
                "copies": { "type": "integer", "minimum": 0 },
                "available": { "type": "boolean" }
            }
        }
    })
}

pub(super) fn document() -> Value {
    json!({
        "paths": {
            "/": {
                "get": {
                    "summary": "List books",
                    "tags": ["Books"],
                    "parameters": [
                        query_parameter("filter", "Exact genre to match"),
                        query_parameter("sortBy", "Field to sort by (default createdAt)"),
                        query_parameter("sort", "`asc` for ascending, descending otherwise"),
                        query_parameter("limit", "Maximum number of books (default 10)")
                    ],
                    "responses": {
                        "200": envelope_response(
                            "Books retrieved",
                            "books",
                            json!({ "type": "array", "items": book_ref() })
                        ),
                        "500": failure_response("Failed to retrieve books")
                    }
                },
                "post": {
                    "summary": "Create a book",
                    "tags": ["Books"],
                    "requestBody": json_body("CreateBook"),
                    "responses": {
                        "201": envelope_response("Book created", "book", book_ref()),
                        "400": failure_response("Validation failed")
                    }
                }
            },
            "/{id}": {
                "get": {
                    "summary": "Get a book",
                    "tags": ["Books"],
                    "parameters": [id_parameter()],
                    "responses": {
                        "200": envelope_response("Book retrieved; null when unknown", "book", nullable_book()),
                        "500": failure_response("Failed to retrieve book")
                    }
                },
                "put": {
                    "summary": "Update a book",
                    "tags": ["Books"],
                    "parameters": [id_parameter()],
                    "requestBody": json_body("UpdateBook"),
                    "responses": {
                        "200": envelope_response("Book updated; null when unknown", "book", nullable_book()),
                        "400": failure_response("Validation failed")
                    }
                },
                "delete": {
                    "summary": "Delete a book",
                    "tags": ["Books"],
                    "parameters": [id_parameter()],
                    "responses": {
                        "200": envelope_response("Book deleted", "book", json!({ "type": "null" })),
                        "500": failure_response("Failed to delete book")
                    }
                }
            },
            "/health": {
                "get": {
                    "summary": "Books health check",
                    "tags": ["Books"],
                    "responses": {
                        "200": {
                            "description": "OK",
                            "content": { "text/plain": { "schema": { "type": "string" } } }
                        }
                    }
                }
            }
        },
        "components": {
            "schemas": schemas()
        }
    })
}
